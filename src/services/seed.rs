use crate::models::SeekerType;

const DEFAULT_SEEKER_TYPES: &[(&str, &str, &str)] = &[
    ("old_age_home", "Old Age Home", "Residential care for elderly people"),
    ("orphanage", "Orphanage", "Homes caring for children without guardians"),
    ("homeless_shelter", "Homeless Shelter", "Temporary housing for people without homes"),
    ("food_bank", "Food Bank", "Collects and distributes food to those in need"),
    ("disability_center", "Disability Center", "Support centers for people with disabilities"),
    ("womens_shelter", "Women's Shelter", "Safe housing for women and children"),
    ("community_center", "Community Center", "Neighbourhood centers serving local families"),
];

/// Seeker types every fresh deployment starts with; mirrors the migration seed
pub fn default_seeker_types() -> Vec<SeekerType> {
    DEFAULT_SEEKER_TYPES
        .iter()
        .map(|(tag, name, description)| SeekerType {
            tag: tag.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        })
        .collect()
}
