use crate::scoring::{BlacklistEntry, Role, RoleWeights};

const DIDDY_ID: &str = "cabb4fcf-4067-4ba5-908d-76ee66fcf0c6";

/// (MusicBrainz id, name, roles)
const BUILTIN: &[(&str, &str, &[Role])] = &[
    ("61063817-feda-4d21-8ae5-e488e7632eea", "Bad Boy South", &[Role::Label]),
    ("29d43312-a8ed-4d7b-9f4e-f5650318aebb", "Bad Boy Records", &[Role::Label]),
    ("635b9d63-05c1-46ff-a577-0ce030e6e84b", "Bad Boy Entertainment", &[Role::Label]),
    ("ba4b8ffa-d518-4f75-b0c1-659472cf0a9d", "Love Label", &[Role::Label]),
    (
        DIDDY_ID,
        "Diddy",
        &[
            Role::Artist,
            Role::Feature,
            Role::Producer,
            Role::Mix,
            Role::Vocal,
            Role::Composer,
            Role::Default,
        ],
    ),
    ("2072f699-049a-4b78-b039-317a1c7cff94", "Diddy and the Family", &[Role::Artist]),
    ("c9ba7b22-51bd-4beb-affd-9bf682479f41", "Bugatti Boyz", &[Role::Artist]),
    ("480cdd78-e54e-4518-9ec9-572a62d7e1e1", "Diddy - Dirty Money", &[Role::Artist]),
    ("3195aa16-a32e-4fde-8dd2-1bdf021ed3ca", "Three The...", &[Role::Artist]),
];

/// Built-in blacklist, each entry weighted by its role.
pub fn default_entries(weights: &RoleWeights) -> Vec<BlacklistEntry> {
    BUILTIN
        .iter()
        .flat_map(|(id, name, roles)| {
            roles.iter().map(move |role| BlacklistEntry {
                id: id.to_string(),
                name: name.to_string(),
                role: *role,
                weight: weights
                    .get(*role)
                    .or_else(|| weights.get(Role::Default))
                    .unwrap_or(0),
            })
        })
        .collect()
}
