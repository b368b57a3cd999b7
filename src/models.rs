use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LivingStatus {
    Own,
    Relative,
    Shelter,
}

impl LivingStatus {
    pub const ALL: [LivingStatus; 3] = [Self::Own, Self::Relative, Self::Shelter];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Own => "OWN",
            Self::Relative => "RELATIVE",
            Self::Shelter => "SHELTER",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Own => "Own home",
            Self::Relative => "Relative\u{2019}s home",
            Self::Shelter => "Temporary shelter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FoodSufficiency {
    Yes,
    No,
}

impl FoodSufficiency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportSource {
    Government,
    NgoCharity,
    CommunityRelatives,
    NoneYet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    // household information
    pub name: String,
    pub contact_number: String,
    pub family_members: u32,
    pub vulnerable_elderly: bool,
    pub vulnerable_children_u5: bool,
    pub vulnerable_pregnant_lactating: bool,

    // housing and living conditions
    pub house_structurally_damaged: bool,
    pub furniture_lost: bool,
    pub living_status: Option<LivingStatus>,
    pub need_repairs: bool,
    pub need_bedding: bool,
    pub need_cooking_items: bool,
    pub need_water: bool,
    pub need_sanitation: bool,

    // livelihood and income
    pub previous_job_business: String,
    pub tools_equipment_lost: bool,
    pub unable_to_work_currently: bool,
    pub restart_tools: bool,
    pub restart_materials: bool,
    pub restart_capital: bool,
    pub restart_training: bool,

    // food and essential supplies
    pub enough_daily_food: Option<FoodSufficiency>,
    pub clean_drinking_water_available: bool,
    pub need_dry_rations: bool,
    pub need_hygiene_items: bool,
    pub need_medicine: bool,
    pub need_clothing: bool,

    // children and schooling
    pub children_attending_school_before_flood: bool,
    pub lost_books_uniforms_supplies: bool,
    pub issues_returning_to_school: String,
    pub school_transport_affected: bool,

    // health and well-being
    pub illnesses_after_flood: String,
    pub on_regular_medication: bool,
    pub emotional_stress_adults: bool,
    pub emotional_stress_children: bool,

    // support received
    pub support_government: bool,
    pub support_ngo_charity: bool,
    pub support_community_relatives: bool,
    pub support_none: bool,

    // priority needs
    pub priority_1: String,
    pub priority_2: String,
    pub priority_3: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldUpdate {
    Name(String),
    ContactNumber(String),
    FamilyMembers(u32),
    VulnerableElderly(bool),
    VulnerableChildrenU5(bool),
    VulnerablePregnantLactating(bool),

    HouseStructurallyDamaged(bool),
    FurnitureLost(bool),
    LivingStatus(Option<LivingStatus>),
    NeedRepairs(bool),
    NeedBedding(bool),
    NeedCookingItems(bool),
    NeedWater(bool),
    NeedSanitation(bool),

    PreviousJobBusiness(String),
    ToolsEquipmentLost(bool),
    UnableToWorkCurrently(bool),
    RestartTools(bool),
    RestartMaterials(bool),
    RestartCapital(bool),
    RestartTraining(bool),

    EnoughDailyFood(Option<FoodSufficiency>),
    CleanDrinkingWaterAvailable(bool),
    NeedDryRations(bool),
    NeedHygieneItems(bool),
    NeedMedicine(bool),
    NeedClothing(bool),

    ChildrenAttendingSchoolBeforeFlood(bool),
    LostBooksUniformsSupplies(bool),
    IssuesReturningToSchool(String),
    SchoolTransportAffected(bool),

    IllnessesAfterFlood(String),
    OnRegularMedication(bool),
    EmotionalStressAdults(bool),
    EmotionalStressChildren(bool),

    SupportGovernment(bool),
    SupportNgoCharity(bool),
    SupportCommunityRelatives(bool),
    SupportNone(bool),

    #[serde(rename = "priority_1")]
    Priority1(String),
    #[serde(rename = "priority_2")]
    Priority2(String),
    #[serde(rename = "priority_3")]
    Priority3(String),
    Notes(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentPayload {
    pub name: String,
    pub contact_number: String,
    pub family_members: u32,
    pub vulnerable_elderly: bool,
    pub vulnerable_children_u5: bool,
    pub vulnerable_pregnant_lactating: bool,

    pub house_structurally_damaged: bool,
    pub furniture_lost: bool,
    pub living_own_home: bool,
    pub living_relatives_home: bool,
    pub living_temporary_shelter: bool,
    pub need_repairs: bool,
    pub need_bedding: bool,
    pub need_cooking_items: bool,
    pub need_water: bool,
    pub need_sanitation: bool,

    pub previous_job_business: Option<String>,
    pub tools_equipment_lost: bool,
    pub unable_to_work_currently: bool,
    pub restart_tools: bool,
    pub restart_materials: bool,
    pub restart_capital: bool,
    pub restart_training: bool,

    pub enough_daily_food: Option<FoodSufficiency>,
    pub clean_drinking_water_available: bool,
    pub need_dry_rations: bool,
    pub need_hygiene_items: bool,
    pub need_medicine: bool,
    pub need_clothing: bool,

    pub children_attending_school_before_flood: bool,
    pub lost_books_uniforms_supplies: bool,
    pub issues_returning_to_school: Option<String>,
    pub school_transport_affected: bool,

    pub illnesses_after_flood: Option<String>,
    pub on_regular_medication: bool,
    pub emotional_stress_adults: bool,
    pub emotional_stress_children: bool,

    pub support_government: bool,
    pub support_ngo_charity: bool,
    pub support_community_relatives: bool,
    pub support_none: bool,

    pub priority_1: Option<String>,
    pub priority_2: Option<String>,
    pub priority_3: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentRecord {
    #[serde(deserialize_with = "loose_optional_text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "loose_optional_text")]
    pub token_number: Option<String>,
    #[serde(deserialize_with = "loose_optional_text")]
    pub collected_at: Option<String>,

    #[serde(deserialize_with = "loose_text")]
    pub name: String,
    #[serde(deserialize_with = "loose_text")]
    pub contact_number: String,
    #[serde(deserialize_with = "loose_count")]
    pub family_members: u32,
    #[serde(deserialize_with = "loose_bool")]
    pub vulnerable_elderly: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub vulnerable_children_u5: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub vulnerable_pregnant_lactating: bool,

    #[serde(deserialize_with = "loose_bool")]
    pub house_structurally_damaged: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub furniture_lost: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub living_own_home: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub living_relatives_home: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub living_temporary_shelter: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub need_repairs: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub need_bedding: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub need_cooking_items: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub need_water: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub need_sanitation: bool,

    #[serde(deserialize_with = "loose_optional_text")]
    pub previous_job_business: Option<String>,
    #[serde(deserialize_with = "loose_bool")]
    pub tools_equipment_lost: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub unable_to_work_currently: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub restart_tools: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub restart_materials: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub restart_capital: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub restart_training: bool,

    #[serde(deserialize_with = "loose_optional_text")]
    pub enough_daily_food: Option<String>,
    #[serde(deserialize_with = "loose_bool")]
    pub clean_drinking_water_available: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub need_dry_rations: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub need_hygiene_items: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub need_medicine: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub need_clothing: bool,

    #[serde(deserialize_with = "loose_bool")]
    pub children_attending_school_before_flood: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub lost_books_uniforms_supplies: bool,
    #[serde(deserialize_with = "loose_optional_text")]
    pub issues_returning_to_school: Option<String>,
    #[serde(deserialize_with = "loose_bool")]
    pub school_transport_affected: bool,

    #[serde(deserialize_with = "loose_optional_text")]
    pub illnesses_after_flood: Option<String>,
    #[serde(deserialize_with = "loose_bool")]
    pub on_regular_medication: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub emotional_stress_adults: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub emotional_stress_children: bool,

    #[serde(deserialize_with = "loose_bool")]
    pub support_government: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub support_ngo_charity: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub support_community_relatives: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub support_none: bool,

    #[serde(deserialize_with = "loose_optional_text")]
    pub priority_1: Option<String>,
    #[serde(deserialize_with = "loose_optional_text")]
    pub priority_2: Option<String>,
    #[serde(deserialize_with = "loose_optional_text")]
    pub priority_3: Option<String>,
    #[serde(deserialize_with = "loose_optional_text")]
    pub notes: Option<String>,
}

/// Decodes one listed row. The backend is loose about column types, so
/// flags may arrive as `0`/`1` and text as numbers; `null` reads as unset.
pub fn record_from_value(value: Value) -> Result<AssessmentRecord, serde_json::Error> {
    serde_json::from_value(value)
}

fn loose_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn loose_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_optional_text(deserializer)?.unwrap_or_default())
}

fn loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "y"
        ),
        _ => false,
    })
}

fn loose_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(count.map_or(0, |c| u32::try_from(c).unwrap_or(u32::MAX)))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodayStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cards: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub charts: StatsCharts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsCharts {
    #[serde(default, deserialize_with = "null_as_default")]
    pub needs_breakdown: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub top_priorities: Vec<PriorityCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityCount {
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: i64,
}

/// Reads a named counter; anything missing or non-numeric counts as zero.
pub fn counter(map: &BTreeMap<String, Value>, key: &str) -> i64 {
    match map.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}
