/// Regions where container groups can be created
pub const VALID_REGIONS: &[&str] = &[
    "westeurope",
    "westus",
    "eastus",
    "southeastasia",
    "westus2",
    "northeurope",
    "eastus2",
    "centralus",
    "australiaeast",
];

/// Normalize a display name like "West US" to its ARM form "westus"
pub fn normalize_region(region: &str) -> String {
    region.to_lowercase().replace(' ', "")
}

pub fn is_valid_region(region: &str) -> bool {
    let normalized = normalize_region(region);
    VALID_REGIONS.contains(&normalized.as_str())
}
