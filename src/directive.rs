//! Directive kinds and the extension that dispatches them

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::component::{
    ComponentEntry, ComponentReference, ComponentRegistry, ResolvedContext, SearchPaths,
    VariantResolver,
};
use crate::compose::{layers, IncludeCall};
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::parser::ast::DirectiveNode;
use crate::parser::{find_directives, parse_directive_at};

/// A custom tag the extension knows how to parse and compile
pub trait DirectiveKind: Send + Sync {
    /// Tag name as written after `{%`
    fn tag(&self) -> &str;

    /// Parse a directive found at `offset` in its template
    fn parse(&self, source: &str, offset: usize) -> Result<DirectiveNode, CompileError> {
        parse_directive_at(source, self.tag(), offset).map_err(CompileError::from)
    }

    /// Turn a parsed directive into a host include call
    fn compile(&self, node: &DirectiveNode, extension: &Extension) -> Result<IncludeCall, CompileError>;
}

/// Resolution results for one `render` directive
///
/// The node stays untouched; everything learned while compiling lives here.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDirective<'a> {
    pub node: &'a DirectiveNode,
    pub reference: ComponentReference,
    pub entry: ComponentEntry,
    /// `None` when `only` without `with` skips context loading
    pub context: Option<ResolvedContext>,
}

impl ResolvedDirective<'_> {
    pub fn include_call(&self) -> IncludeCall {
        IncludeCall::new(
            self.entry.template_id.clone(),
            layers(
                self.context.as_ref(),
                self.node.variables.as_ref().map(|v| &v.node),
                self.node.only,
            ),
            self.node.only,
            self.node.ignore_missing,
            self.node.span.clone(),
        )
    }
}

/// `{% render <component> [ignore missing] [with <expr>] [only] %}`
#[derive(Debug, Clone, Default)]
pub struct RenderDirective;

impl RenderDirective {
    pub const TAG: &'static str = "render";

    /// Look up the component and load its variant context
    pub fn resolve<'a>(
        &self,
        node: &'a DirectiveNode,
        extension: &Extension,
    ) -> Result<ResolvedDirective<'a>, CompileError> {
        let component = &node.component;
        let Some(text) = component.node.as_constant_str() else {
            return Err(CompileError::syntax(
                component.span.clone(),
                "component expression must be a constant string",
            ));
        };
        let Some(reference) = ComponentReference::parse(&text) else {
            return Err(CompileError::syntax(
                component.span.clone(),
                format!("missing component name in '{}'", text),
            ));
        };

        let entry = extension
            .registry()
            .resolve(&reference.component)
            .map_err(|e| CompileError::from(e).at(node.span.clone()))?
            .clone();

        let context = if node.only && node.variables.is_none() {
            debug!(component = %reference, "Skipping variant context for isolated render");
            None
        } else {
            let context = extension
                .resolver()
                .load_context(&entry.config_id, reference.variant.as_deref())
                .map_err(|e| CompileError::from(e).at(node.span.clone()))?;
            Some(context)
        };

        Ok(ResolvedDirective {
            node,
            reference,
            entry,
            context,
        })
    }
}

impl DirectiveKind for RenderDirective {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn compile(&self, node: &DirectiveNode, extension: &Extension) -> Result<IncludeCall, CompileError> {
        Ok(self.resolve(node, extension)?.include_call())
    }
}

/// Registered directive kinds plus the component lookup they share
pub struct Extension {
    registry: ComponentRegistry,
    resolver: VariantResolver,
    kinds: BTreeMap<String, Box<dyn DirectiveKind>>,
}

impl std::fmt::Debug for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extension")
            .field("registry", &self.registry)
            .field("resolver", &self.resolver)
            .field("tags", &self.kinds.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Extension {
    /// Extension with the `render` directive over the loader's roots
    pub fn new(loader: impl SearchPaths + 'static, config: &CompilerConfig) -> Self {
        let resolver = if config.cache_configs {
            VariantResolver::cached()
        } else {
            VariantResolver::new()
        };
        let mut extension = Self {
            registry: ComponentRegistry::new(loader, config),
            resolver,
            kinds: BTreeMap::new(),
        };
        extension.register(RenderDirective);
        extension
    }

    /// Extension over the roots listed in the configuration
    pub fn from_config(config: &CompilerConfig) -> Self {
        Self::new(config.loader(), config)
    }

    /// Add a directive kind, replacing any kind with the same tag
    pub fn register(&mut self, kind: impl DirectiveKind + 'static) {
        self.kinds.insert(kind.tag().to_string(), Box::new(kind));
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        self.kinds.keys().map(|s| s.as_str()).collect()
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &VariantResolver {
        &self.resolver
    }

    /// Compile a single directive, bare or wrapped in `{% %}`
    pub fn compile_directive(&self, source: &str) -> Result<IncludeCall, CompileError> {
        self.compile_at(source, 0)
    }

    /// Compile every registered directive in a template, in source order
    ///
    /// Stops at the first failing directive.
    pub fn compile_template(&self, source: &str) -> Result<Vec<IncludeCall>, CompileError> {
        let tags = self.tags();
        let calls = find_directives(source, &tags)
            .into_iter()
            .map(|found| self.compile_at(&source[found.span.clone()], found.span.start))
            .collect::<Result<Vec<_>, _>>()?;
        info!(directives = calls.len(), "Compiled template");
        Ok(calls)
    }

    fn compile_at(&self, source: &str, offset: usize) -> Result<IncludeCall, CompileError> {
        let (tag, span) = leading_tag(source, offset);
        let kind = self
            .kinds
            .get(tag)
            .ok_or_else(|| CompileError::UnknownTag {
                tag: tag.to_string(),
                span,
            })?;
        let node = kind.parse(source, offset)?;
        kind.compile(&node, self)
    }
}

/// First word of a directive, skipping an opening `{%`
fn leading_tag(source: &str, offset: usize) -> (&str, std::ops::Range<usize>) {
    let body = source.trim_start();
    let body = match body.strip_prefix("{%") {
        Some(rest) => rest.strip_prefix(['-', '~']).unwrap_or(rest).trim_start(),
        None => body,
    };
    let start = source.len() - body.len();
    let len = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(body.len());
    (&body[..len], offset + start..offset + start + len)
}
