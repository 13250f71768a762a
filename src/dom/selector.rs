use std::collections::BTreeMap;

/// One compound selector such as `input.timezone-card__date-input#date`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    pub(crate) fn matches(&self, tag: &str, attributes: &BTreeMap<String, String>) -> bool {
        if let Some(expected) = &self.tag {
            if expected != tag {
                return false;
            }
        }

        if let Some(expected) = &self.id {
            if attributes.get("id") != Some(expected) {
                return false;
            }
        }

        let classes = attributes.get("class").map(String::as_str).unwrap_or("");
        self.classes
            .iter()
            .all(|class| classes.split_whitespace().any(|c| c == class))
    }

    fn parse(input: &str) -> Option<Self> {
        let mut compound = Compound::default();
        let mut rest = input;

        let tag_len = rest.find(['.', '#']).unwrap_or(rest.len());
        if tag_len > 0 {
            let tag = &rest[..tag_len];
            if tag != "*" {
                if !is_identifier(tag) {
                    return None;
                }
                compound.tag = Some(tag.to_ascii_lowercase());
            }
            rest = &rest[tag_len..];
        }

        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let len = body.find(['.', '#']).unwrap_or(body.len());
            let name = &body[..len];
            if !is_identifier(name) {
                return None;
            }
            match marker {
                '.' => compound.classes.push(name.to_string()),
                '#' => {
                    if compound.id.is_some() {
                        return None;
                    }
                    compound.id = Some(name.to_string());
                }
                _ => return None,
            }
            rest = &body[len..];
        }

        Some(compound)
    }
}

/// Compounds joined by descendant combinators, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Selector {
    pub(crate) compounds: Vec<Compound>,
}

impl Selector {
    pub(crate) fn parse(input: &str) -> Option<Self> {
        let compounds = input
            .split_whitespace()
            .map(Compound::parse)
            .collect::<Option<Vec<_>>>()?;

        if compounds.is_empty() {
            return None;
        }
        Some(Self { compounds })
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
