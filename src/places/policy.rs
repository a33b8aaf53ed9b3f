//! Static per-country policy: overrides, limits and popular cities.
//!
//! Tables hold canonical names; every lookup goes through the alias resolver
//! so any spelling of a listed country matches.

use std::collections::HashMap;

use super::aliases::{self, normalize};
use super::sampling;
use super::types::{CanonicalCountry, CountryRules};

pub const DEFAULT_LIMIT: usize = 100;
pub const MIN_ITEMS: usize = 30;

/// Countries with no place data at all.
const NO_DATA: &[&str] = &[
    "Antarctica",
    "Bouvet Island",
    "British Indian Ocean Territory",
    "French Southern Territories",
    "Heard Island and McDonald Islands",
    "South Georgia and the South Sandwich Islands",
    "United States Minor Outlying Islands",
];

/// City-states and enclaves: city mode only, never divisions.
const FORCE_CITIES: &[&str] = &[
    "Singapore",
    "Monaco",
    "Vatican City",
    "Hong Kong",
    "Macau",
    "Gibraltar",
];

/// Countries whose generic city data is unreliable; their divisions serve as cities.
const DIVISIONS_AS_CITIES: &[&str] = &["Turkey", "Kuwait", "Lebanon", "Qatar"];

/// Continental-scale countries served from the curated list only.
const POPULAR_ONLY: &[&str] = &["United States", "China", "India", "Russia", "Brazil", "Indonesia"];

/// Legitimately small place lists, exempt from the minimum-size threshold.
const SMALL_COUNTRIES: &[&str] = &[
    "Andorra", "Bahrain", "Brunei", "Djibouti", "Gibraltar", "Hong Kong",
    "Kuwait", "Lebanon", "Liechtenstein", "Luxembourg", "Macau", "Monaco",
    "Palestine", "Qatar", "San Marino", "Singapore", "Vatican City",
];

const COUNTRY_LIMITS: &[(&str, usize)] = &[
    ("United States", 120),
    ("China", 60),
    ("India", 80),
    ("Russia", 80),
    ("Indonesia", 60),
    ("Singapore", 20),
    ("Monaco", 10),
    ("Vatican City", 5),
];

const POPULAR_CITIES: &[(&str, &[&str])] = &[
    ("United States", &[
        "New York", "Los Angeles", "Chicago", "Houston", "Phoenix", "Philadelphia",
        "San Antonio", "San Diego", "Dallas", "San Jose", "Austin", "Jacksonville",
        "San Francisco", "Columbus", "Fort Worth", "Indianapolis", "Charlotte",
        "Seattle", "Denver", "Washington", "Boston", "El Paso", "Nashville",
        "Detroit", "Portland", "Las Vegas", "Memphis", "Louisville", "Baltimore",
        "Milwaukee", "Albuquerque", "Atlanta", "Miami", "Minneapolis", "New Orleans",
    ]),
    ("China", &[
        "Shanghai", "Beijing", "Chongqing", "Tianjin", "Guangzhou", "Shenzhen",
        "Chengdu", "Nanjing", "Wuhan", "Xi'an", "Hangzhou", "Shenyang", "Harbin",
        "Suzhou", "Qingdao", "Dalian", "Zhengzhou", "Jinan", "Changsha", "Kunming",
    ]),
    ("India", &[
        "Mumbai", "Delhi", "Bangalore", "Hyderabad", "Ahmedabad", "Chennai",
        "Kolkata", "Surat", "Pune", "Jaipur", "Lucknow", "Kanpur", "Nagpur",
        "Indore", "Thane", "Bhopal", "Visakhapatnam", "Patna", "Vadodara", "Kochi",
    ]),
    ("Russia", &[
        "Moscow", "Saint Petersburg", "Novosibirsk", "Yekaterinburg", "Kazan",
        "Nizhny Novgorod", "Chelyabinsk", "Samara", "Omsk", "Rostov-on-Don",
        "Ufa", "Krasnoyarsk", "Voronezh", "Perm", "Volgograd", "Vladivostok",
    ]),
    ("Brazil", &[
        "São Paulo", "Rio de Janeiro", "Brasília", "Salvador", "Fortaleza",
        "Belo Horizonte", "Manaus", "Curitiba", "Recife", "Goiânia", "Belém",
        "Porto Alegre", "Campinas", "São Luís", "Maceió", "Natal", "Florianópolis",
    ]),
    ("Indonesia", &[
        "Jakarta", "Surabaya", "Bandung", "Medan", "Semarang", "Makassar",
        "Palembang", "Tangerang", "Depok", "Bekasi", "Denpasar", "Yogyakarta",
    ]),
    ("Canada", &["Toronto", "Montreal", "Vancouver", "Calgary", "Edmonton", "Ottawa", "Winnipeg", "Quebec City", "Hamilton", "Halifax"]),
    ("Australia", &["Sydney", "Melbourne", "Brisbane", "Perth", "Adelaide", "Canberra", "Hobart", "Darwin"]),
    ("Germany", &["Berlin", "Hamburg", "Munich", "Cologne", "Frankfurt", "Stuttgart", "Düsseldorf", "Leipzig", "Dortmund", "Dresden"]),
    ("France", &["Paris", "Marseille", "Lyon", "Toulouse", "Nice", "Nantes", "Strasbourg", "Montpellier", "Bordeaux", "Lille"]),
    ("United Kingdom", &["London", "Birmingham", "Manchester", "Glasgow", "Liverpool", "Leeds", "Edinburgh", "Bristol", "Cardiff", "Belfast"]),
    ("Italy", &["Rome", "Milan", "Naples", "Turin", "Palermo", "Genoa", "Bologna", "Florence", "Venice", "Verona"]),
    ("Spain", &["Madrid", "Barcelona", "Valencia", "Seville", "Zaragoza", "Málaga", "Murcia", "Palma", "Bilbao", "Alicante"]),
    ("Japan", &["Tokyo", "Yokohama", "Osaka", "Nagoya", "Sapporo", "Fukuoka", "Kobe", "Kyoto", "Kawasaki", "Hiroshima"]),
    ("Mexico", &["Mexico City", "Guadalajara", "Monterrey", "Puebla", "Tijuana", "León", "Juárez", "Mérida", "Cancún", "Querétaro"]),
    ("Sweden", &["Stockholm", "Gothenburg", "Malmö", "Uppsala", "Västerås", "Örebro"]),
    ("Saudi Arabia", &["Riyadh", "Jeddah", "Mecca", "Medina", "Dammam", "Khobar"]),
    ("Egypt", &["Cairo", "Alexandria", "Giza", "Luxor", "Aswan"]),
    ("Nigeria", &["Lagos", "Abuja", "Kano", "Ibadan", "Port Harcourt"]),
    ("Pakistan", &["Karachi", "Lahore", "Islamabad", "Faisalabad", "Rawalpindi", "Peshawar"]),
];

/// How policy short-circuits the tier chain for a country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    NoData,
    DivisionsAsCities,
    PopularOnly,
    ForceCities,
}

fn listed(table: &[&str], country: &CanonicalCountry) -> bool {
    let key = country.key();
    table.iter().any(|entry| normalize(&aliases::canonical_of(entry).name) == key)
}

/// Curated popular cities for a country; empty when none are curated.
pub fn popular_cities(country: &CanonicalCountry) -> &'static [&'static str] {
    let key = country.key();
    POPULAR_CITIES
        .iter()
        .find(|(name, _)| normalize(name) == key)
        .map(|(_, cities)| *cities)
        .unwrap_or(&[])
}

/// Immutable policy tables plus operator-supplied limits.
#[derive(Debug, Clone)]
pub struct PolicyTables {
    default_limit: usize,
    min_items: usize,
    limits: HashMap<String, usize>,
}

impl Default for PolicyTables {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PolicyTables {
    /// Built-in tables with the stock per-country limits.
    pub fn builtin() -> Self {
        let limits = COUNTRY_LIMITS
            .iter()
            .map(|(name, limit)| (normalize(name), *limit))
            .collect();
        Self {
            default_limit: DEFAULT_LIMIT,
            min_items: MIN_ITEMS,
            limits,
        }
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_min_items(mut self, min_items: usize) -> Self {
        self.min_items = min_items;
        self
    }

    /// Override the limit for one country (any spelling).
    pub fn with_limit(mut self, country: &str, limit: usize) -> Self {
        self.limits.insert(aliases::canonical_of(country).key(), limit);
        self
    }

    pub fn override_for(&self, country: &CanonicalCountry) -> Option<Override> {
        if listed(NO_DATA, country) {
            Some(Override::NoData)
        } else if listed(DIVISIONS_AS_CITIES, country) {
            Some(Override::DivisionsAsCities)
        } else if listed(POPULAR_ONLY, country) {
            Some(Override::PopularOnly)
        } else if listed(FORCE_CITIES, country) {
            Some(Override::ForceCities)
        } else {
            None
        }
    }

    pub fn limit_for(&self, country: &CanonicalCountry) -> usize {
        self.limits
            .get(&country.key())
            .copied()
            .unwrap_or(self.default_limit)
    }

    /// Small countries and islands may return lists below the threshold.
    pub fn is_small(&self, country: &CanonicalCountry) -> bool {
        listed(SMALL_COUNTRIES, country) || aliases::is_likely_island(&country.name)
    }

    pub fn rules_for(&self, country: &CanonicalCountry) -> CountryRules {
        CountryRules {
            limit: self.limit_for(country),
            min_items: if self.is_small(country) { 1 } else { self.min_items },
        }
    }

    /// Cap a list with the country's popular cities as seeds.
    pub fn cap(&self, country: &CanonicalCountry, items: &[String]) -> Vec<String> {
        sampling::cap_to_limit(popular_cities(country), items, self.limit_for(country))
    }
}
