//! Turns a loose project description into a small ordered set of
//! verticalized search queries. Pure and deterministic — no I/O, no clock.

use crate::types::Project;

/// A vertical match: the phrase emitted in the base query.
struct VerticalMatch {
    phrase: &'static str,
}

/// Prioritized keyword ladder. First match wins, which is why the fintech
/// sub-branches are each checked before the generic "fintech/payments"
/// fallback, and neobank is checked before all of fintech — otherwise a
/// neobank description would be mis-classified as generic fintech.
fn detect_vertical(description: &str) -> Option<VerticalMatch> {
    let d = description.to_lowercase();

    let rules: &[(&[&str], &str)] = &[
        (&["neobank", "challenger bank"], "neobank challenger bank mobile banking"),
        (&["mobile money"], "mobile money"),
        (&["lending", "loan origination", "micro-loan", "microloan"], "digital lending fintech"),
        (&["remittance", "money transfer"], "remittance fintech"),
        (
            &["payment infrastructure", "payment gateway", "payments api", "payment rails"],
            "payments infrastructure fintech",
        ),
        (&["savings", "savings app"], "savings fintech"),
        (&["fintech", "payments"], "fintech payments"),
        (&["construction material", "building material"], "construction materials"),
        (&["logistics", "delivery", "last-mile"], "logistics delivery"),
        (&["agritech", "agtech", "agriculture technology"], "agritech"),
        (&["healthtech", "health technology", "digital health", "telemedicine"], "healthtech"),
        (&["marketplace", "e-commerce", "ecommerce"], "marketplace e-commerce"),
        (&["edtech", "education technology"], "edtech"),
    ];

    for (keywords, phrase) in rules {
        if keywords.iter().any(|k| d.contains(k)) {
            return Some(VerticalMatch { phrase });
        }
    }
    None
}

const WEST_AFRICA_CODES: &[&str] = &[
    "NG", "GH", "SN", "CI", "ML", "BF", "NE", "TG", "BJ", "GN", "SL", "LR", "GM", "GW", "MR", "CV",
];
const EAST_AFRICA_CODES: &[&str] = &["KE", "TZ", "UG", "RW", "ET", "SO", "BI", "SS", "DJ", "ER"];
const AFRICAN_COUNTRY_NAMES: &[(&str, &str)] = &[
    ("nigeria", "NG"),
    ("ghana", "GH"),
    ("kenya", "KE"),
    ("senegal", "SN"),
    ("tanzania", "TZ"),
    ("uganda", "UG"),
    ("south africa", "ZA"),
    ("egypt", "EG"),
    ("ivory coast", "CI"),
    ("côte d'ivoire", "CI"),
    ("ethiopia", "ET"),
    ("rwanda", "RW"),
];

/// All codes this module recognizes as African, for the "any African codes
/// → Africa" fallback tier.
fn is_african_code(code: &str) -> bool {
    WEST_AFRICA_CODES.contains(&code) || EAST_AFRICA_CODES.contains(&code) || AFRICAN_COUNTRY_NAMES.iter().any(|(_, c)| *c == code)
}

/// Human-readable region name for an ISO-3166 alpha-2 code. Falls back to
/// the code itself when unrecognized.
pub fn region_name(code: &str) -> String {
    let upper = code.to_uppercase();
    let known: &[(&str, &str)] = &[
        ("NG", "Nigeria"),
        ("GH", "Ghana"),
        ("SN", "Senegal"),
        ("CI", "Côte d'Ivoire"),
        ("ML", "Mali"),
        ("BF", "Burkina Faso"),
        ("NE", "Niger"),
        ("TG", "Togo"),
        ("BJ", "Benin"),
        ("GN", "Guinea"),
        ("SL", "Sierra Leone"),
        ("LR", "Liberia"),
        ("GM", "Gambia"),
        ("GW", "Guinea-Bissau"),
        ("MR", "Mauritania"),
        ("CV", "Cabo Verde"),
        ("KE", "Kenya"),
        ("TZ", "Tanzania"),
        ("UG", "Uganda"),
        ("RW", "Rwanda"),
        ("ET", "Ethiopia"),
        ("SO", "Somalia"),
        ("BI", "Burundi"),
        ("SS", "South Sudan"),
        ("DJ", "Djibouti"),
        ("ER", "Eritrea"),
        ("ZA", "South Africa"),
        ("EG", "Egypt"),
        ("US", "United States"),
        ("GB", "United Kingdom"),
    ];
    known
        .iter()
        .find(|(c, _)| *c == upper)
        .map(|(_, name)| name.to_string())
        .unwrap_or(upper)
}

/// Detect geography from description phrases first, then region-code
/// majorities.
fn detect_geography(description: &str, regions: &[String]) -> Option<String> {
    let d = description.to_lowercase();
    if d.contains("west africa") {
        return Some("West Africa".to_string());
    }
    if d.contains("east africa") {
        return Some("East Africa".to_string());
    }
    for (name, _) in AFRICAN_COUNTRY_NAMES {
        if d.contains(name) {
            return Some(region_name(
                AFRICAN_COUNTRY_NAMES.iter().find(|(n, _)| n == name).unwrap().1,
            ));
        }
    }

    if regions.is_empty() {
        return None;
    }
    let upper: Vec<String> = regions.iter().map(|r| r.to_uppercase()).collect();
    let west_count = upper.iter().filter(|r| WEST_AFRICA_CODES.contains(&r.as_str())).count();
    let east_count = upper.iter().filter(|r| EAST_AFRICA_CODES.contains(&r.as_str())).count();
    let african_count = upper.iter().filter(|r| is_african_code(r)).count();

    if west_count * 2 > upper.len() {
        Some("West Africa".to_string())
    } else if east_count * 2 > upper.len() {
        Some("East Africa".to_string())
    } else if african_count > 0 {
        Some("Africa".to_string())
    } else {
        None
    }
}

/// Detect the business type phrase ("B2B"/"B2C"/"wholesale"), if present.
fn detect_type(description: &str) -> Option<&'static str> {
    let d = description.to_lowercase();
    if d.contains("b2b") {
        Some("B2B")
    } else if d.contains("b2c") {
        Some("B2C")
    } else if d.contains("wholesale") {
        Some("wholesale")
    } else {
        None
    }
}

fn compose_base_query(
    vertical_phrase: &str,
    business_type: Option<&str>,
    keywords: &[String],
    geography: Option<&str>,
) -> String {
    let mut parts = vec![vertical_phrase.to_string()];
    if let Some(t) = business_type {
        parts.push(t.to_string());
    }
    if !keywords.is_empty() {
        parts.push(keywords.join(" "));
    }
    if let Some(g) = geography {
        parts.push(g.to_string());
    }
    parts.push("startup".to_string());
    parts.join(" ")
}

fn is_empty_project(project: &Project) -> bool {
    project.name.trim().is_empty()
        && project.description.trim().is_empty()
        && project.keywords.is_empty()
        && project.industries.is_empty()
        && project.regions.is_empty()
}

const MAX_QUERIES: usize = 5;

/// Produce 1–5 specific search queries from a project.
pub fn build(project: &Project) -> Vec<String> {
    if is_empty_project(project) {
        return vec!["startup company".to_string()];
    }

    let vertical = detect_vertical(&project.description);
    let geography = detect_geography(&project.description, &project.regions);
    let business_type = detect_type(&project.description);

    let mut queries = Vec::with_capacity(MAX_QUERIES);

    let base = match &vertical {
        Some(v) => compose_base_query(v.phrase, business_type, &project.keywords, geography.as_deref()),
        None => format!("{} competitors", project.name),
    };
    queries.push(base);

    if project.keywords.is_empty() {
        queries.truncate(MAX_QUERIES);
        return queries;
    }

    let region_codes: Vec<Option<&String>> = if project.regions.is_empty() {
        vec![None]
    } else {
        project.regions.iter().map(Some).collect()
    };

    'outer: for keyword in &project.keywords {
        for region in &region_codes {
            if queries.len() >= MAX_QUERIES {
                break 'outer;
            }
            let mut q = keyword.clone();
            if let Some(code) = region {
                q.push(' ');
                q.push_str(&region_name(code));
            }
            queries.push(q);

            if queries.len() >= MAX_QUERIES {
                break 'outer;
            }
            if let Some(industry) = project.industries.first() {
                queries.push(format!("{} {} startup", keyword, industry));
            }
        }
    }

    queries.truncate(MAX_QUERIES);
    queries
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn project(name: &str, description: &str, keywords: &[&str], industries: &[&str], regions: &[&str]) -> Project {
        Project {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.to_string(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            industries: industries.iter().map(|s| s.to_string()).collect(),
            regions: regions.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn empty_project_falls_back_to_startup_company() {
        let p = project("", "", &[], &[], &[]);
        assert_eq!(build(&p), vec!["startup company".to_string()]);
    }

    #[test]
    fn neobank_beats_generic_fintech() {
        let p = project(
            "Kuda-like",
            "a mobile-first challenger bank for francophone Africa",
            &[],
            &[],
            &[],
        );
        let queries = build(&p);
        assert!(queries[0].contains("neobank"));
    }

    #[test]
    fn west_africa_region_majority_detected() {
        let p = project("Acme", "a fintech company", &[], &[], &["NG", "GH", "SN"]);
        let queries = build(&p);
        assert!(queries[0].contains("West Africa"));
    }

    #[test]
    fn no_vertical_falls_back_to_project_name() {
        let p = project("Acme Corp", "a generic business", &[], &[], &[]);
        let queries = build(&p);
        assert_eq!(queries[0], "Acme Corp competitors");
    }

    #[test]
    fn output_length_always_in_range() {
        let p = project(
            "Acme",
            "fintech",
            &["lending", "savings", "payments", "remittance", "wallet", "credit"],
            &["Financial Services"],
            &["NG", "GH", "KE"],
        );
        let queries = build(&p);
        assert!(queries.len() >= 1 && queries.len() <= 5);
        assert!(queries.iter().all(|q| !q.is_empty()));
    }

    #[test]
    fn region_name_falls_back_to_code() {
        assert_eq!(region_name("NG"), "Nigeria");
        assert_eq!(region_name("zz"), "ZZ");
    }
}
