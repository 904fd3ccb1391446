use crate::types::Endpoint;

const REFERENCE_DATA: &str = "referenceData";

/// (name, key holding the list)
const ENTRIES: &[(&str, &str)] = &[
    ("analyte", REFERENCE_DATA),
    ("branch", REFERENCE_DATA),
    ("category", REFERENCE_DATA),
    ("country", REFERENCE_DATA),
    ("domain", "domains"),
    ("individualService", REFERENCE_DATA),
    ("metrologyArea", REFERENCE_DATA),
    ("nuclide", REFERENCE_DATA),
    ("quantity", REFERENCE_DATA),
    ("radiationMedium", REFERENCE_DATA),
    ("radiationSource", REFERENCE_DATA),
    ("service", REFERENCE_DATA),
    ("subService", REFERENCE_DATA),
];

/// Every known KCDB reference-data endpoint, in catalog order
pub fn all() -> Vec<Endpoint> {
    ENTRIES
        .iter()
        .map(|(name, key)| endpoint(name, key))
        .collect()
}

/// Case-insensitive lookup by endpoint name
pub fn lookup(name: &str) -> Option<Endpoint> {
    ENTRIES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(n, key)| endpoint(n, key))
}

fn endpoint(name: &str, key: &str) -> Endpoint {
    Endpoint::new(name, format!("referenceData/{}", name), Some(key))
}
