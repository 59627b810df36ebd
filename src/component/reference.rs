//! Parsing of `@name--variant` component references

/// Separator between component and variant names
pub const VARIANT_SEPARATOR: &str = "--";

/// A component name with an optional variant, as written in a directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentReference {
    /// Component name with any leading `@` removed
    pub component: String,
    /// Second `--` segment, if present and non-empty; later segments are dropped
    pub variant: Option<String>,
}

impl ComponentReference {
    /// Parse `["@"]name["--"variant]`
    ///
    /// Returns `None` when the component name is empty.
    pub fn parse(reference: &str) -> Option<Self> {
        let trimmed = reference.trim();
        let mut segments = trimmed.split(VARIANT_SEPARATOR);
        let component = segments.next().unwrap_or_default().trim_start_matches('@');
        let variant = segments.next();
        if component.is_empty() {
            return None;
        }

        Some(Self {
            component: component.to_string(),
            variant: variant.filter(|v| !v.is_empty()).map(str::to_string),
        })
    }
}

impl std::fmt::Display for ComponentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "@{}{}{}", self.component, VARIANT_SEPARATOR, variant),
            None => write!(f, "@{}", self.component),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_variant() {
        let r = ComponentReference::parse("@hero--compact").unwrap();
        assert_eq!(r.component, "hero");
        assert_eq!(r.variant.as_deref(), Some("compact"));
    }

    #[test]
    fn test_parse_without_variant() {
        let r = ComponentReference::parse("hero").unwrap();
        assert_eq!(r.component, "hero");
        assert_eq!(r.variant, None);
    }

    #[test]
    fn test_parse_ignores_segments_after_variant() {
        let r = ComponentReference::parse("@card--wide--dark").unwrap();
        assert_eq!(r.component, "card");
        assert_eq!(r.variant.as_deref(), Some("wide"));

        let r = ComponentReference::parse("@card----dark").unwrap();
        assert_eq!(r.variant, None);
    }

    #[test]
    fn test_parse_empty_variant_is_none() {
        let r = ComponentReference::parse("@card--").unwrap();
        assert_eq!(r.variant, None);
    }

    #[test]
    fn test_parse_empty_component_rejected() {
        assert_eq!(ComponentReference::parse("@"), None);
        assert_eq!(ComponentReference::parse(""), None);
        assert_eq!(ComponentReference::parse("--compact"), None);
    }

    #[test]
    fn test_display_round_trip() {
        let r = ComponentReference::parse("card--wide").unwrap();
        assert_eq!(r.to_string(), "@card--wide");
    }
}
