//! Country name normalization, alias groups and flag codes.
//!
//! Every lookup goes through [`normalize`], so "Türkiye", "TURKIYE" and
//! "turkiye" land on the same key. Unknown names are never an error: they are
//! treated as already canonical.

use std::collections::HashMap;
use std::sync::OnceLock;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use super::types::CanonicalCountry;

/// Known spellings per country. The first entry is the canonical name.
const ALIAS_GROUPS: &[&[&str]] = &[
    &["United States", "USA", "US", "U.S.", "U.S.A.", "United States of America", "America"],
    &["United Kingdom", "UK", "U.K.", "Great Britain", "Britain", "United Kingdom of Great Britain and Northern Ireland"],
    &["Turkey", "Türkiye", "Turkiye", "Republic of Türkiye"],
    &["Ivory Coast", "Côte d'Ivoire", "Cote d'Ivoire", "Cote dIvoire", "Republic of Côte d'Ivoire"],
    &["Czech Republic", "Czechia"],
    &["Russia", "Russian Federation"],
    &["South Korea", "Korea, Republic of", "Republic of Korea", "Korea (South)", "Korea (Republic of)", "Korea"],
    &["North Korea", "Korea, Democratic People's Republic of", "Korea (North)", "Korea (Democratic People's Republic of)", "DPRK"],
    &["Myanmar", "Burma"],
    &["Eswatini", "Swaziland"],
    &["North Macedonia", "Macedonia"],
    &["Netherlands", "Holland", "The Netherlands"],
    &["United Arab Emirates", "UAE", "Emirates"],
    &["Vatican City", "Holy See", "Vatican"],
    &["Cape Verde", "Cabo Verde"],
    &["Democratic Republic of the Congo", "DR Congo", "DRC", "Congo-Kinshasa", "Congo (Kinshasa)", "Congo, Democratic Republic of the", "Congo (Democratic Republic of the)"],
    &["Republic of the Congo", "Congo-Brazzaville", "Congo (Brazzaville)", "Congo"],
    &["Timor-Leste", "East Timor"],
    &["Palestine", "State of Palestine", "Palestinian Territories"],
    &["Iran", "Islamic Republic of Iran", "Iran, Islamic Republic of"],
    &["Syria", "Syrian Arab Republic"],
    &["Laos", "Lao People's Democratic Republic", "Lao PDR"],
    &["Vietnam", "Viet Nam"],
    &["Bolivia", "Plurinational State of Bolivia"],
    &["Venezuela", "Bolivarian Republic of Venezuela"],
    &["Tanzania", "United Republic of Tanzania"],
    &["Moldova", "Republic of Moldova"],
    &["Brunei", "Brunei Darussalam"],
    &["Micronesia", "Federated States of Micronesia"],
    &["China", "People's Republic of China", "PRC"],
    &["Taiwan", "Republic of China"],
    &["Hong Kong", "Hong Kong SAR", "Hong Kong SAR China"],
    &["Macau", "Macao", "Macau SAR"],
    &["Saint Martin (French part)", "Saint Martin", "Saint-Martin", "St. Martin", "Collectivity of Saint Martin"],
    &["Sint Maarten (Dutch part)", "Sint Maarten", "St. Maarten"],
    &["Falkland Islands", "Falkland Islands (Malvinas)", "Malvinas"],
    &["Bosnia and Herzegovina", "Bosnia", "Bosnia & Herzegovina"],
    &["Trinidad and Tobago", "Trinidad & Tobago"],
    &["Antigua and Barbuda", "Antigua & Barbuda"],
    &["Saint Kitts and Nevis", "St. Kitts and Nevis", "Saint Kitts & Nevis"],
    &["Saint Vincent and the Grenadines", "St. Vincent and the Grenadines"],
    &["Saint Lucia", "St. Lucia"],
    &["São Tomé and Príncipe", "Sao Tome and Principe"],
    &["Curaçao", "Curacao"],
    &["Réunion", "Reunion"],
    &["Åland Islands", "Aland Islands"],
    &["Germany", "Deutschland"],
    &["Spain", "España"],
    &["Sweden", "Sverige"],
    &["Norway", "Norge"],
    &["Brazil", "Brasil"],
    &["Mexico", "México"],
    &["India", "Bharat"],
    &["Japan", "Nippon"],
    &["Saudi Arabia", "KSA", "Kingdom of Saudi Arabia"],
    &["Egypt", "Arab Republic of Egypt"],
    &["Antarctica", "Antarctic"],
];

/// Bare names shared by two countries. A qualifier after one of these picks
/// the country, so it is never stripped.
const AMBIGUOUS_HEADS: &[&str] = &["korea", "congo"];

/// Fragments that identify the Ivory Coast family of spellings.
const IVORY_COAST_MARKERS: &[&str] = &["ivory coast", "ivoire", "ivorian"];

/// Island territories that do not carry "island" in their name.
const KNOWN_ISLANDS: &[&str] = &[
    "antigua and barbuda", "aruba", "bahamas", "bahrain", "barbados", "bermuda",
    "cape verde", "comoros", "cuba", "curacao", "cyprus", "dominica",
    "dominican republic", "fiji", "grenada", "guadeloupe", "guam", "guernsey",
    "haiti", "iceland", "jamaica", "jersey", "kiribati", "madagascar",
    "maldives", "malta", "martinique", "mauritius", "mayotte", "micronesia",
    "nauru", "new caledonia", "palau", "puerto rico", "reunion", "saint lucia",
    "saint kitts and nevis", "saint vincent and the grenadines", "samoa",
    "sao tome and principe", "seychelles", "singapore", "sri lanka",
    "timor-leste", "tonga", "trinidad and tobago", "tuvalu", "vanuatu",
    "saint martin (french part)", "sint maarten (dutch part)",
];

/// Lowercase, strip diacritics, trim and collapse inner whitespace.
pub fn normalize(name: &str) -> String {
    name.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(|c| c.to_lowercase())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn alias_index() -> &'static HashMap<String, usize> {
    static INDEX: OnceLock<HashMap<String, usize>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut index = HashMap::new();
        for (i, group) in ALIAS_GROUPS.iter().enumerate() {
            for name in group.iter() {
                index.entry(normalize(name)).or_insert(i);
            }
        }
        index
    })
}

/// Drop a trailing parenthetical qualifier: "United States (US)" → "united states".
fn strip_qualifier(key: &str) -> Option<&str> {
    let idx = key.find('(')?;
    let head = key[..idx].trim_end();
    if head.is_empty() || AMBIGUOUS_HEADS.contains(&head) {
        None
    } else {
        Some(head)
    }
}

fn find_group(name: &str) -> Option<&'static [&'static str]> {
    let key = normalize(name);
    let index = alias_index();
    let i = index
        .get(&key)
        .or_else(|| strip_qualifier(&key).and_then(|head| index.get(head)))?;
    Some(ALIAS_GROUPS[*i])
}

/// Canonical name plus every known spelling, or just the input when unknown.
pub fn variants_of(country: &str) -> Vec<String> {
    match find_group(country) {
        Some(group) => group.iter().map(|s| s.to_string()).collect(),
        None => vec![country.to_string()],
    }
}

/// Resolve any spelling to its canonical country.
pub fn canonical_of(country: &str) -> CanonicalCountry {
    match find_group(country) {
        Some(group) => CanonicalCountry {
            name: group[0].to_string(),
            variants: group.iter().map(|s| s.to_string()).collect(),
        },
        None => {
            let name = country.trim().to_string();
            CanonicalCountry {
                variants: vec![name.clone()],
                name,
            }
        }
    }
}

/// Do two spellings name the same country?
pub fn same_country(a: &str, b: &str) -> bool {
    normalize(&canonical_of(a).name) == normalize(&canonical_of(b).name)
}

/// Territory code for flag rendering. `None` is a normal answer.
pub fn flag_code_for(country: &str) -> Option<&'static str> {
    let key = normalize(country);
    if key.is_empty() {
        return None;
    }
    if let Some(code) = saint_martin_side(&key) {
        return Some(code);
    }
    if IVORY_COAST_MARKERS.iter().any(|m| key.contains(m)) {
        return Some("CI");
    }
    let canonical = canonical_of(country);
    code_for_canonical(&normalize(&canonical.name))
        .or_else(|| strip_qualifier(&key).and_then(code_for_canonical))
}

/// The island is split between France (MF) and the Netherlands (SX);
/// the two must never share a code.
fn saint_martin_side(key: &str) -> Option<&'static str> {
    let dutch = key.contains("maarten") || (key.contains("martin") && key.contains("dutch"));
    if dutch {
        return Some("SX");
    }
    let french = ["saint martin", "saint-martin", "st. martin", "st martin"]
        .iter()
        .any(|m| key.contains(m));
    if french {
        Some("MF")
    } else {
        None
    }
}

/// Rough island test, used to excuse tiny place lists.
pub fn is_likely_island(country: &str) -> bool {
    let key = normalize(&canonical_of(country).name);
    let named = key
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| matches!(w, "island" | "islands" | "isle" | "isles" | "islas" | "ile" | "iles"));
    named || KNOWN_ISLANDS.contains(&key.as_str())
}

fn code_for_canonical(n: &str) -> Option<&'static str> {
    let code = match n {
        "afghanistan" => "AF", "aland islands" => "AX", "albania" => "AL",
        "algeria" => "DZ", "andorra" => "AD", "angola" => "AO",
        "antarctica" => "AQ", "antigua and barbuda" => "AG", "argentina" => "AR",
        "armenia" => "AM", "aruba" => "AW", "australia" => "AU",
        "austria" => "AT", "azerbaijan" => "AZ", "bahamas" => "BS",
        "bahrain" => "BH", "bangladesh" => "BD", "barbados" => "BB",
        "belarus" => "BY", "belgium" => "BE", "belize" => "BZ",
        "benin" => "BJ", "bermuda" => "BM", "bhutan" => "BT",
        "bolivia" => "BO", "bosnia and herzegovina" => "BA", "botswana" => "BW",
        "bouvet island" => "BV", "brazil" => "BR", "british indian ocean territory" => "IO",
        "brunei" => "BN", "bulgaria" => "BG", "burkina faso" => "BF",
        "burundi" => "BI", "cambodia" => "KH", "cameroon" => "CM",
        "canada" => "CA", "cape verde" => "CV", "central african republic" => "CF",
        "chad" => "TD", "chile" => "CL", "china" => "CN",
        "colombia" => "CO", "comoros" => "KM", "costa rica" => "CR",
        "croatia" => "HR", "cuba" => "CU", "curacao" => "CW",
        "cyprus" => "CY", "czech republic" => "CZ",
        "democratic republic of the congo" => "CD", "denmark" => "DK",
        "djibouti" => "DJ", "dominica" => "DM", "dominican republic" => "DO",
        "ecuador" => "EC", "egypt" => "EG", "el salvador" => "SV",
        "equatorial guinea" => "GQ", "eritrea" => "ER", "estonia" => "EE",
        "eswatini" => "SZ", "ethiopia" => "ET", "falkland islands" => "FK",
        "fiji" => "FJ", "finland" => "FI", "france" => "FR",
        "french southern territories" => "TF", "gabon" => "GA", "gambia" => "GM",
        "georgia" => "GE", "germany" => "DE", "ghana" => "GH",
        "gibraltar" => "GI", "greece" => "GR", "greenland" => "GL",
        "grenada" => "GD", "guadeloupe" => "GP", "guam" => "GU",
        "guatemala" => "GT", "guernsey" => "GG", "guinea" => "GN",
        "guinea-bissau" => "GW", "guyana" => "GY", "haiti" => "HT",
        "heard island and mcdonald islands" => "HM", "honduras" => "HN",
        "hong kong" => "HK", "hungary" => "HU", "iceland" => "IS",
        "india" => "IN", "indonesia" => "ID", "iran" => "IR",
        "iraq" => "IQ", "ireland" => "IE", "isle of man" => "IM",
        "israel" => "IL", "italy" => "IT", "ivory coast" => "CI",
        "jamaica" => "JM", "japan" => "JP", "jersey" => "JE",
        "jordan" => "JO", "kazakhstan" => "KZ", "kenya" => "KE",
        "kiribati" => "KI", "kosovo" => "XK", "kuwait" => "KW",
        "kyrgyzstan" => "KG", "laos" => "LA", "latvia" => "LV",
        "lebanon" => "LB", "lesotho" => "LS", "liberia" => "LR",
        "libya" => "LY", "liechtenstein" => "LI", "lithuania" => "LT",
        "luxembourg" => "LU", "macau" => "MO", "madagascar" => "MG",
        "malawi" => "MW", "malaysia" => "MY", "maldives" => "MV",
        "mali" => "ML", "malta" => "MT", "marshall islands" => "MH",
        "martinique" => "MQ", "mauritania" => "MR", "mauritius" => "MU",
        "mayotte" => "YT", "mexico" => "MX", "micronesia" => "FM",
        "moldova" => "MD", "monaco" => "MC", "mongolia" => "MN",
        "montenegro" => "ME", "morocco" => "MA", "mozambique" => "MZ",
        "myanmar" => "MM", "namibia" => "NA", "nauru" => "NR",
        "nepal" => "NP", "netherlands" => "NL", "new caledonia" => "NC",
        "new zealand" => "NZ", "nicaragua" => "NI", "niger" => "NE",
        "nigeria" => "NG", "north korea" => "KP", "north macedonia" => "MK",
        "norway" => "NO", "oman" => "OM", "pakistan" => "PK",
        "palau" => "PW", "palestine" => "PS", "panama" => "PA",
        "papua new guinea" => "PG", "paraguay" => "PY", "peru" => "PE",
        "philippines" => "PH", "poland" => "PL", "portugal" => "PT",
        "puerto rico" => "PR", "qatar" => "QA", "republic of the congo" => "CG",
        "reunion" => "RE", "romania" => "RO", "russia" => "RU",
        "rwanda" => "RW", "saint kitts and nevis" => "KN", "saint lucia" => "LC",
        "saint vincent and the grenadines" => "VC", "samoa" => "WS",
        "san marino" => "SM", "sao tome and principe" => "ST",
        "saudi arabia" => "SA", "senegal" => "SN", "serbia" => "RS",
        "seychelles" => "SC", "sierra leone" => "SL", "singapore" => "SG",
        "slovakia" => "SK", "slovenia" => "SI", "solomon islands" => "SB",
        "somalia" => "SO", "south africa" => "ZA",
        "south georgia and the south sandwich islands" => "GS",
        "south korea" => "KR", "south sudan" => "SS", "spain" => "ES",
        "sri lanka" => "LK", "sudan" => "SD", "suriname" => "SR",
        "sweden" => "SE", "switzerland" => "CH", "syria" => "SY",
        "taiwan" => "TW", "tajikistan" => "TJ", "tanzania" => "TZ",
        "thailand" => "TH", "timor-leste" => "TL", "togo" => "TG",
        "tonga" => "TO", "trinidad and tobago" => "TT", "tunisia" => "TN",
        "turkey" => "TR", "turkmenistan" => "TM", "tuvalu" => "TV",
        "uganda" => "UG", "ukraine" => "UA", "united arab emirates" => "AE",
        "united kingdom" => "GB", "united states" => "US",
        "united states minor outlying islands" => "UM", "uruguay" => "UY",
        "uzbekistan" => "UZ", "vanuatu" => "VU", "vatican city" => "VA",
        "venezuela" => "VE", "vietnam" => "VN", "yemen" => "YE",
        "zambia" => "ZM", "zimbabwe" => "ZW",
        _ => return None,
    };
    Some(code)
}
