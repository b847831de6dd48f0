use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tuition {
    #[serde(default)]
    pub in_state: String,
    #[serde(default)]
    pub out_of_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_price: Option<String>,
}

/// One college as seen on one page. Every value is a display string;
/// nothing is coerced to numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollegeRecord {
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub tuition: Tuition,
    #[serde(default)]
    pub acceptance_rate: String,
    #[serde(default)]
    pub sat_range: String,
    #[serde(default)]
    pub act_range: String,
    #[serde(default)]
    pub gpa: String,
    #[serde(default)]
    pub rankings: BTreeMap<String, String>,
    #[serde(default)]
    pub demographics: BTreeMap<String, String>,
    #[serde(default)]
    pub majors: Vec<String>,
    #[serde(default)]
    pub financial_aid: BTreeMap<String, String>,
    #[serde(default)]
    pub campus_life: BTreeMap<String, String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "Utc::now")]
    pub scraped_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl CollegeRecord {
    pub fn new(url: &str) -> Self {
        CollegeRecord {
            name: String::new(),
            location: String::new(),
            kind: String::new(),
            size: String::new(),
            tuition: Tuition::default(),
            acceptance_rate: String::new(),
            sat_range: String::new(),
            act_range: String::new(),
            gpa: String::new(),
            rankings: BTreeMap::new(),
            demographics: BTreeMap::new(),
            majors: Vec::new(),
            financial_aid: BTreeMap::new(),
            campus_life: BTreeMap::new(),
            source: String::new(),
            url: url.to_string(),
            scraped_at: Utc::now(),
            analyzed_at: None,
        }
    }

    /// Write a classified stat value into its slot.
    pub fn set_stat(&mut self, field: StatField, value: String) {
        match field {
            StatField::AcceptanceRate => self.acceptance_rate = value,
            StatField::TuitionInState => self.tuition.in_state = value,
            StatField::TuitionOutOfState => self.tuition.out_of_state = value,
            StatField::NetPrice => self.tuition.net_price = Some(value),
            StatField::Size => self.size = value,
            StatField::SatRange => self.sat_range = value,
            StatField::ActRange => self.act_range = value,
            StatField::Gpa => self.gpa = value,
        }
    }

    pub fn add_major(&mut self, major: String) {
        if !major.is_empty() && !self.majors.contains(&major) {
            self.majors.push(major);
        }
    }
}

/// Slots a stat-like element can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    AcceptanceRate,
    TuitionInState,
    TuitionOutOfState,
    NetPrice,
    Size,
    SatRange,
    ActRange,
    Gpa,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub name: String,
    pub url: String,
    pub added_at: DateTime<Utc>,
}

impl WatchlistEntry {
    pub fn new(name: &str, url: &str) -> Self {
        WatchlistEntry {
            name: name.to_string(),
            url: url.to_string(),
            added_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub auto_analyze: bool,
    pub show_notifications: bool,
    pub theme: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            auto_analyze: true,
            show_notifications: true,
            theme: "light".to_string(),
        }
    }
}
