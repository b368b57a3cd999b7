use crate::client::AssessmentApi;
use crate::models::{
    AssessmentPayload, AssessmentRecord, Draft, FieldUpdate, FoodSufficiency, LivingStatus,
    SupportSource,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

pub const MAX_TAGS: usize = 10;
pub const CHECKLIST_TOTAL: usize = 5;

pub const NAME_REQUIRED: &str = "Name is required.";
pub const CONTACT_REQUIRED: &str = "Contact number is required.";
pub const LIVING_REQUIRED: &str = "Please select where the household is currently living.";
pub const FOOD_REQUIRED: &str = "Please select whether there is enough daily food.";

pub const SAVED: &str = "Saved successfully.";
pub const SAVE_REJECTED: &str = "Failed to save. Please try again.";
pub const SAVE_UNREACHABLE: &str = "Failed to save. Please check the backend and try again.";
pub const CLEARED: &str = "Form cleared.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checklist {
    pub has_name: bool,
    pub has_contact: bool,
    pub has_living: bool,
    pub has_food: bool,
    pub has_priority: bool,
    pub complete_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TagFlags {
    pub structural_damage: bool,
    pub furniture_lost: bool,
    pub needs_water: bool,
    pub needs_sanitation: bool,
    pub needs_medicine: bool,
    pub needs_dry_rations: bool,
    pub no_support: bool,
    pub unable_to_work: bool,
    pub children_under_5: bool,
    pub elderly: bool,
    pub pregnant_lactating: bool,
    pub in_shelter: bool,
    pub not_enough_food: bool,
}

impl TagFlags {
    pub fn from_draft(draft: &Draft) -> Self {
        Self {
            structural_damage: draft.house_structurally_damaged,
            furniture_lost: draft.furniture_lost,
            needs_water: draft.need_water,
            needs_sanitation: draft.need_sanitation,
            needs_medicine: draft.need_medicine,
            needs_dry_rations: draft.need_dry_rations,
            no_support: draft.support_none,
            unable_to_work: draft.unable_to_work_currently,
            children_under_5: draft.vulnerable_children_u5,
            elderly: draft.vulnerable_elderly,
            pregnant_lactating: draft.vulnerable_pregnant_lactating,
            in_shelter: draft.living_status == Some(LivingStatus::Shelter),
            not_enough_food: draft.enough_daily_food == Some(FoodSufficiency::No),
        }
    }

    pub fn from_record(record: &AssessmentRecord) -> Self {
        Self {
            structural_damage: record.house_structurally_damaged,
            furniture_lost: record.furniture_lost,
            needs_water: record.need_water,
            needs_sanitation: record.need_sanitation,
            needs_medicine: record.need_medicine,
            needs_dry_rations: record.need_dry_rations,
            no_support: record.support_none,
            unable_to_work: record.unable_to_work_currently,
            children_under_5: record.vulnerable_children_u5,
            elderly: record.vulnerable_elderly,
            pregnant_lactating: record.vulnerable_pregnant_lactating,
            in_shelter: record.living_temporary_shelter,
            not_enough_food: record.enough_daily_food.as_deref() == Some("NO"),
        }
    }
}

pub fn summary_tags(flags: TagFlags) -> Vec<&'static str> {
    [
        (flags.structural_damage, "Structural damage"),
        (flags.furniture_lost, "Furniture lost"),
        (flags.needs_water, "Needs water"),
        (flags.needs_sanitation, "Needs sanitation"),
        (flags.needs_medicine, "Needs medicine"),
        (flags.needs_dry_rations, "Needs dry rations"),
        (flags.no_support, "No support yet"),
        (flags.unable_to_work, "Unable to work"),
        (flags.children_under_5, "Children <5"),
        (flags.elderly, "Elderly"),
        (flags.pregnant_lactating, "Pregnant/Lactating"),
        (flags.in_shelter, "In temporary shelter"),
        (flags.not_enough_food, "Not enough food"),
    ]
    .into_iter()
    .filter_map(|(raised, label)| raised.then_some(label))
    .take(MAX_TAGS)
    .collect()
}

fn has_text(value: &str) -> bool {
    !value.trim().is_empty()
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Holds a busy flag up until dropped, so a cancelled request releases it too.
pub(crate) struct BusyFlag<'a>(&'a AtomicBool);

impl<'a> BusyFlag<'a> {
    pub(crate) fn raise(flag: &'a AtomicBool) -> Option<Self> {
        (!flag.swap(true, Ordering::SeqCst)).then_some(Self(flag))
    }
}

impl Drop for BusyFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormViewModel {
    draft: Draft,
}

impl FormViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn reset(&mut self) {
        self.draft = Draft::default();
    }

    pub fn set_field(&mut self, update: FieldUpdate) {
        let d = &mut self.draft;
        match update {
            FieldUpdate::Name(v) => d.name = v,
            FieldUpdate::ContactNumber(v) => d.contact_number = v,
            FieldUpdate::FamilyMembers(v) => d.family_members = v,
            FieldUpdate::VulnerableElderly(v) => d.vulnerable_elderly = v,
            FieldUpdate::VulnerableChildrenU5(v) => d.vulnerable_children_u5 = v,
            FieldUpdate::VulnerablePregnantLactating(v) => d.vulnerable_pregnant_lactating = v,

            FieldUpdate::HouseStructurallyDamaged(v) => d.house_structurally_damaged = v,
            FieldUpdate::FurnitureLost(v) => d.furniture_lost = v,
            FieldUpdate::LivingStatus(v) => d.living_status = v,
            FieldUpdate::NeedRepairs(v) => d.need_repairs = v,
            FieldUpdate::NeedBedding(v) => d.need_bedding = v,
            FieldUpdate::NeedCookingItems(v) => d.need_cooking_items = v,
            FieldUpdate::NeedWater(v) => d.need_water = v,
            FieldUpdate::NeedSanitation(v) => d.need_sanitation = v,

            FieldUpdate::PreviousJobBusiness(v) => d.previous_job_business = v,
            FieldUpdate::ToolsEquipmentLost(v) => d.tools_equipment_lost = v,
            FieldUpdate::UnableToWorkCurrently(v) => d.unable_to_work_currently = v,
            FieldUpdate::RestartTools(v) => d.restart_tools = v,
            FieldUpdate::RestartMaterials(v) => d.restart_materials = v,
            FieldUpdate::RestartCapital(v) => d.restart_capital = v,
            FieldUpdate::RestartTraining(v) => d.restart_training = v,

            FieldUpdate::EnoughDailyFood(v) => d.enough_daily_food = v,
            FieldUpdate::CleanDrinkingWaterAvailable(v) => d.clean_drinking_water_available = v,
            FieldUpdate::NeedDryRations(v) => d.need_dry_rations = v,
            FieldUpdate::NeedHygieneItems(v) => d.need_hygiene_items = v,
            FieldUpdate::NeedMedicine(v) => d.need_medicine = v,
            FieldUpdate::NeedClothing(v) => d.need_clothing = v,

            FieldUpdate::ChildrenAttendingSchoolBeforeFlood(v) => {
                d.children_attending_school_before_flood = v
            }
            FieldUpdate::LostBooksUniformsSupplies(v) => d.lost_books_uniforms_supplies = v,
            FieldUpdate::IssuesReturningToSchool(v) => d.issues_returning_to_school = v,
            FieldUpdate::SchoolTransportAffected(v) => d.school_transport_affected = v,

            FieldUpdate::IllnessesAfterFlood(v) => d.illnesses_after_flood = v,
            FieldUpdate::OnRegularMedication(v) => d.on_regular_medication = v,
            FieldUpdate::EmotionalStressAdults(v) => d.emotional_stress_adults = v,
            FieldUpdate::EmotionalStressChildren(v) => d.emotional_stress_children = v,

            FieldUpdate::SupportGovernment(v) => self.set_support(SupportSource::Government, v),
            FieldUpdate::SupportNgoCharity(v) => self.set_support(SupportSource::NgoCharity, v),
            FieldUpdate::SupportCommunityRelatives(v) => {
                self.set_support(SupportSource::CommunityRelatives, v)
            }
            FieldUpdate::SupportNone(v) => self.set_support(SupportSource::NoneYet, v),

            FieldUpdate::Priority1(v) => d.priority_1 = v,
            FieldUpdate::Priority2(v) => d.priority_2 = v,
            FieldUpdate::Priority3(v) => d.priority_3 = v,
            FieldUpdate::Notes(v) => d.notes = v,
        }
    }

    // "no support yet" excludes the other three; those combine freely
    pub fn set_support(&mut self, source: SupportSource, value: bool) {
        let d = &mut self.draft;
        match source {
            SupportSource::Government => d.support_government = value,
            SupportSource::NgoCharity => d.support_ngo_charity = value,
            SupportSource::CommunityRelatives => d.support_community_relatives = value,
            SupportSource::NoneYet => d.support_none = value,
        }

        if !value {
            return;
        }

        if source == SupportSource::NoneYet {
            d.support_government = false;
            d.support_ngo_charity = false;
            d.support_community_relatives = false;
        } else {
            d.support_none = false;
        }
    }

    pub fn completion_checklist(&self) -> Checklist {
        let d = &self.draft;
        let has_name = has_text(&d.name);
        let has_contact = has_text(&d.contact_number);
        let has_living = d.living_status.is_some();
        let has_food = d.enough_daily_food.is_some();
        let has_priority = [&d.priority_1, &d.priority_2, &d.priority_3]
            .into_iter()
            .any(|p| has_text(p));

        let complete_count = [has_name, has_contact, has_living, has_food, has_priority]
            .into_iter()
            .filter(|done| *done)
            .count();

        Checklist {
            has_name,
            has_contact,
            has_living,
            has_food,
            has_priority,
            complete_count,
            total_count: CHECKLIST_TOTAL,
        }
    }

    pub fn summary_tags(&self) -> Vec<&'static str> {
        summary_tags(TagFlags::from_draft(&self.draft))
    }

    pub fn validate_for_submission(&self) -> Option<&'static str> {
        let d = &self.draft;
        if !has_text(&d.name) {
            return Some(NAME_REQUIRED);
        }
        if !has_text(&d.contact_number) {
            return Some(CONTACT_REQUIRED);
        }
        if d.living_status.is_none() {
            return Some(LIVING_REQUIRED);
        }
        if d.enough_daily_food.is_none() {
            return Some(FOOD_REQUIRED);
        }
        None
    }

    pub fn to_backend_payload(&self) -> AssessmentPayload {
        let d = &self.draft;
        AssessmentPayload {
            name: d.name.trim().to_string(),
            contact_number: d.contact_number.trim().to_string(),
            family_members: d.family_members,
            vulnerable_elderly: d.vulnerable_elderly,
            vulnerable_children_u5: d.vulnerable_children_u5,
            vulnerable_pregnant_lactating: d.vulnerable_pregnant_lactating,

            house_structurally_damaged: d.house_structurally_damaged,
            furniture_lost: d.furniture_lost,
            living_own_home: d.living_status == Some(LivingStatus::Own),
            living_relatives_home: d.living_status == Some(LivingStatus::Relative),
            living_temporary_shelter: d.living_status == Some(LivingStatus::Shelter),
            need_repairs: d.need_repairs,
            need_bedding: d.need_bedding,
            need_cooking_items: d.need_cooking_items,
            need_water: d.need_water,
            need_sanitation: d.need_sanitation,

            previous_job_business: optional_text(&d.previous_job_business),
            tools_equipment_lost: d.tools_equipment_lost,
            unable_to_work_currently: d.unable_to_work_currently,
            restart_tools: d.restart_tools,
            restart_materials: d.restart_materials,
            restart_capital: d.restart_capital,
            restart_training: d.restart_training,

            enough_daily_food: d.enough_daily_food,
            clean_drinking_water_available: d.clean_drinking_water_available,
            need_dry_rations: d.need_dry_rations,
            need_hygiene_items: d.need_hygiene_items,
            need_medicine: d.need_medicine,
            need_clothing: d.need_clothing,

            children_attending_school_before_flood: d.children_attending_school_before_flood,
            lost_books_uniforms_supplies: d.lost_books_uniforms_supplies,
            issues_returning_to_school: optional_text(&d.issues_returning_to_school),
            school_transport_affected: d.school_transport_affected,

            illnesses_after_flood: optional_text(&d.illnesses_after_flood),
            on_regular_medication: d.on_regular_medication,
            emotional_stress_adults: d.emotional_stress_adults,
            emotional_stress_children: d.emotional_stress_children,

            support_government: d.support_government,
            support_ngo_charity: d.support_ngo_charity,
            support_community_relatives: d.support_community_relatives,
            support_none: d.support_none,

            priority_1: optional_text(&d.priority_1),
            priority_2: optional_text(&d.priority_2),
            priority_3: optional_text(&d.priority_3),
            notes: optional_text(&d.notes),
        }
    }

    pub fn view(&self, submitting: bool) -> FormView {
        FormView {
            draft: self.draft.clone(),
            checklist: self.completion_checklist(),
            tags: self.summary_tags(),
            submitting,
        }
    }

    pub fn review(&self) -> FormReview {
        FormReview {
            checklist: self.completion_checklist(),
            tags: self.summary_tags(),
            blocking_error: self.validate_for_submission(),
            payload: self.to_backend_payload(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub draft: Draft,
    pub checklist: Checklist,
    pub tags: Vec<&'static str>,
    pub submitting: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormReview {
    pub checklist: Checklist,
    pub tags: Vec<&'static str>,
    pub blocking_error: Option<&'static str>,
    pub payload: AssessmentPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Saved(String),
    Invalid(String),
    Failed(String),
    Busy,
}

#[derive(Debug, Default)]
pub struct FormSession {
    view: Mutex<FormViewModel>,
    submitting: AtomicBool,
}

impl FormSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    pub async fn view(&self) -> FormView {
        self.view.lock().await.view(self.is_submitting())
    }

    pub async fn review(&self) -> FormReview {
        self.view.lock().await.review()
    }

    pub async fn set_field(&self, update: FieldUpdate) -> FormView {
        let mut form = self.view.lock().await;
        form.set_field(update);
        form.view(self.is_submitting())
    }

    pub async fn reset(&self) -> FormView {
        let mut form = self.view.lock().await;
        form.reset();
        form.view(self.is_submitting())
    }

    pub async fn submit<A>(&self, api: &A) -> SubmitOutcome
    where
        A: AssessmentApi + ?Sized,
    {
        let Some(_busy) = BusyFlag::raise(&self.submitting) else {
            return SubmitOutcome::Busy;
        };
        self.submit_once(api).await
    }

    async fn submit_once<A>(&self, api: &A) -> SubmitOutcome
    where
        A: AssessmentApi + ?Sized,
    {
        let payload = {
            let form = self.view.lock().await;
            if let Some(message) = form.validate_for_submission() {
                return SubmitOutcome::Invalid(message.to_string());
            }
            form.to_backend_payload()
        };

        match api.create_assessment(&payload).await {
            Ok(()) => {
                info!(contact = %payload.contact_number, "assessment saved");
                self.view.lock().await.reset();
                SubmitOutcome::Saved(SAVED.to_string())
            }
            Err(err) => {
                if err.is_rejection() {
                    warn!("backend refused assessment: {err}");
                } else {
                    error!("failed to submit assessment: {err}");
                }
                SubmitOutcome::Failed(err.user_message(SAVE_REJECTED, SAVE_UNREACHABLE))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;
    use crate::models::TodayStats;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct FakeApi {
        calls: AtomicUsize,
        reject_with: Option<Option<String>>,
        sent: std::sync::Mutex<Vec<AssessmentPayload>>,
    }

    #[async_trait]
    impl AssessmentApi for FakeApi {
        async fn create_assessment(&self, payload: &AssessmentPayload) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.sent.lock().unwrap().push(payload.clone());
            match &self.reject_with {
                Some(message) => Err(ApiError::rejected(message.clone())),
                None => Ok(()),
            }
        }

        async fn today_assessments(&self) -> Result<Vec<AssessmentRecord>, ApiError> {
            Ok(Vec::new())
        }

        async fn today_stats(&self) -> Result<TodayStats, ApiError> {
            Ok(TodayStats::default())
        }

        async fn export_today(&self) -> Result<Vec<u8>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn asha() -> FormViewModel {
        let mut form = FormViewModel::new();
        form.set_field(FieldUpdate::Name("Asha".into()));
        form.set_field(FieldUpdate::ContactNumber("0771234567".into()));
        form.set_field(FieldUpdate::LivingStatus(Some(LivingStatus::Shelter)));
        form.set_field(FieldUpdate::EnoughDailyFood(Some(FoodSufficiency::No)));
        form.set_field(FieldUpdate::Priority1("Water".into()));
        form
    }

    fn raise_every_tag(form: &mut FormViewModel) {
        for update in [
            FieldUpdate::HouseStructurallyDamaged(true),
            FieldUpdate::FurnitureLost(true),
            FieldUpdate::NeedWater(true),
            FieldUpdate::NeedSanitation(true),
            FieldUpdate::NeedMedicine(true),
            FieldUpdate::NeedDryRations(true),
            FieldUpdate::SupportNone(true),
            FieldUpdate::UnableToWorkCurrently(true),
            FieldUpdate::VulnerableChildrenU5(true),
            FieldUpdate::VulnerableElderly(true),
            FieldUpdate::VulnerablePregnantLactating(true),
            FieldUpdate::LivingStatus(Some(LivingStatus::Shelter)),
            FieldUpdate::EnoughDailyFood(Some(FoodSufficiency::No)),
        ] {
            form.set_field(update);
        }
    }

    #[test]
    fn complete_draft_passes_every_check() {
        let form = asha();
        assert_eq!(form.validate_for_submission(), None);

        let checklist = form.completion_checklist();
        assert_eq!(checklist.complete_count, 5);
        assert_eq!(checklist.total_count, 5);

        let tags = form.summary_tags();
        assert!(tags.contains(&"In temporary shelter"));
        assert!(tags.contains(&"Not enough food"));
    }

    #[test]
    fn checklist_count_tracks_each_edit() {
        let mut form = FormViewModel::new();
        assert_eq!(form.completion_checklist().complete_count, 0);

        form.set_field(FieldUpdate::Name("   ".into()));
        assert!(!form.completion_checklist().has_name);

        form.set_field(FieldUpdate::Priority3(" rice ".into()));
        let checklist = form.completion_checklist();
        assert!(checklist.has_priority);
        assert_eq!(checklist.complete_count, 1);

        form.set_field(FieldUpdate::EnoughDailyFood(Some(FoodSufficiency::Yes)));
        form.set_field(FieldUpdate::Priority3(String::new()));
        let checklist = form.completion_checklist();
        let flags = [
            checklist.has_name,
            checklist.has_contact,
            checklist.has_living,
            checklist.has_food,
            checklist.has_priority,
        ];
        assert_eq!(
            checklist.complete_count,
            flags.iter().filter(|f| **f).count()
        );
        assert_eq!(checklist.complete_count, 1);
    }

    #[test]
    fn no_support_clears_the_other_three() {
        let mut form = FormViewModel::new();
        form.set_support(SupportSource::Government, true);
        form.set_support(SupportSource::NgoCharity, true);
        form.set_support(SupportSource::CommunityRelatives, true);

        form.set_support(SupportSource::NoneYet, true);
        let d = form.draft();
        assert!(d.support_none);
        assert!(!d.support_government && !d.support_ngo_charity && !d.support_community_relatives);
    }

    #[test]
    fn any_support_clears_no_support() {
        for source in [
            SupportSource::Government,
            SupportSource::NgoCharity,
            SupportSource::CommunityRelatives,
        ] {
            let mut form = FormViewModel::new();
            form.set_field(FieldUpdate::SupportNone(true));
            form.set_support(source, true);
            assert!(!form.draft().support_none, "{source:?} left support_none set");
        }
    }

    #[test]
    fn kinds_of_support_combine() {
        let mut form = FormViewModel::new();
        form.set_field(FieldUpdate::SupportGovernment(true));
        form.set_field(FieldUpdate::SupportCommunityRelatives(true));
        form.set_field(FieldUpdate::SupportNgoCharity(false));

        let d = form.draft();
        assert!(d.support_government && d.support_community_relatives);
        assert!(!d.support_ngo_charity && !d.support_none);
    }

    #[test]
    fn unticking_no_support_touches_nothing_else() {
        let mut form = FormViewModel::new();
        form.set_field(FieldUpdate::SupportNone(true));
        form.set_field(FieldUpdate::SupportNone(false));
        let d = form.draft();
        assert!(!d.support_none && !d.support_government);
    }

    #[test]
    fn living_situation_expands_to_exactly_one_flag() {
        for status in LivingStatus::ALL {
            let mut form = FormViewModel::new();
            form.set_field(FieldUpdate::LivingStatus(Some(status)));
            let p = form.to_backend_payload();
            let raised = [p.living_own_home, p.living_relatives_home, p.living_temporary_shelter]
                .into_iter()
                .filter(|f| *f)
                .count();
            assert_eq!(raised, 1, "{status:?}");
        }

        let p = FormViewModel::new().to_backend_payload();
        assert!(!p.living_own_home && !p.living_relatives_home && !p.living_temporary_shelter);
    }

    #[test]
    fn padded_text_yields_same_payload_as_trimmed() {
        let mut padded = asha();
        padded.set_field(FieldUpdate::Name("  Asha \t".into()));
        padded.set_field(FieldUpdate::ContactNumber(" 0771234567 ".into()));
        padded.set_field(FieldUpdate::Priority1("\nWater  ".into()));
        padded.set_field(FieldUpdate::Notes("  roof gone ".into()));
        padded.set_field(FieldUpdate::IllnessesAfterFlood("   ".into()));

        let mut trimmed = asha();
        trimmed.set_field(FieldUpdate::Notes("roof gone".into()));

        assert_eq!(padded.to_backend_payload(), trimmed.to_backend_payload());
    }

    #[test]
    fn blank_optional_text_becomes_null() {
        let payload = asha().to_backend_payload();
        assert_eq!(payload.priority_2, None);
        assert_eq!(payload.previous_job_business, None);

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["priority_2"].is_null());
        assert_eq!(json["priority_1"], "Water");
        assert_eq!(json["enough_daily_food"], "NO");
    }

    #[test]
    fn tags_are_capped_and_keep_earliest() {
        let mut form = FormViewModel::new();
        raise_every_tag(&mut form);

        let tags = form.summary_tags();
        assert_eq!(tags.len(), MAX_TAGS);
        assert_eq!(tags[0], "Structural damage");
        assert_eq!(tags[9], "Elderly");
        assert!(!tags.contains(&"In temporary shelter"));
    }

    #[test]
    fn validation_reports_first_missing_field() {
        let mut form = FormViewModel::new();
        assert_eq!(form.validate_for_submission(), Some(NAME_REQUIRED));

        form.set_field(FieldUpdate::Name("Asha".into()));
        assert_eq!(form.validate_for_submission(), Some(CONTACT_REQUIRED));

        form.set_field(FieldUpdate::ContactNumber("077".into()));
        assert_eq!(form.validate_for_submission(), Some(LIVING_REQUIRED));

        form.set_field(FieldUpdate::LivingStatus(Some(LivingStatus::Own)));
        assert_eq!(form.validate_for_submission(), Some(FOOD_REQUIRED));
    }

    #[tokio::test]
    async fn empty_name_never_reaches_the_backend() {
        let session = FormSession::new();
        session.set_field(FieldUpdate::ContactNumber("0771234567".into())).await;
        let api = FakeApi::default();

        let outcome = session.submit(&api).await;
        assert_eq!(outcome, SubmitOutcome::Invalid(NAME_REQUIRED.to_string()));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.view().await.draft.contact_number, "0771234567");
    }

    #[tokio::test]
    async fn successful_submit_clears_the_draft() {
        let session = FormSession {
            view: Mutex::new(asha()),
            submitting: AtomicBool::new(false),
        };
        let api = FakeApi::default();

        let outcome = session.submit(&api).await;
        assert_eq!(outcome, SubmitOutcome::Saved(SAVED.to_string()));
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.sent.lock().unwrap()[0].name, "Asha");
        assert_eq!(session.view().await.draft, Draft::default());
        assert!(!session.is_submitting());
    }

    #[tokio::test]
    async fn rejected_submit_keeps_the_draft() {
        let session = FormSession {
            view: Mutex::new(asha()),
            submitting: AtomicBool::new(false),
        };
        let api = FakeApi {
            reject_with: Some(None),
            ..FakeApi::default()
        };

        let outcome = session.submit(&api).await;
        assert_eq!(outcome, SubmitOutcome::Failed(SAVE_REJECTED.to_string()));
        assert_eq!(session.view().await.draft.name, "Asha");

        let api = FakeApi {
            reject_with: Some(Some("Contact already registered".into())),
            ..FakeApi::default()
        };
        let outcome = session.submit(&api).await;
        assert_eq!(
            outcome,
            SubmitOutcome::Failed("Contact already registered".to_string())
        );
    }

    #[tokio::test]
    async fn submit_while_busy_sends_nothing() {
        let session = FormSession {
            view: Mutex::new(asha()),
            submitting: AtomicBool::new(true),
        };
        let api = FakeApi::default();

        assert_eq!(session.submit(&api).await, SubmitOutcome::Busy);
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
        assert!(session.is_submitting());
    }

    struct StalledApi;

    #[async_trait]
    impl AssessmentApi for StalledApi {
        async fn create_assessment(&self, _payload: &AssessmentPayload) -> Result<(), ApiError> {
            std::future::pending().await
        }

        async fn today_assessments(&self) -> Result<Vec<AssessmentRecord>, ApiError> {
            std::future::pending().await
        }

        async fn today_stats(&self) -> Result<TodayStats, ApiError> {
            std::future::pending().await
        }

        async fn export_today(&self) -> Result<Vec<u8>, ApiError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn abandoned_submit_releases_the_busy_flag() {
        let session = FormSession {
            view: Mutex::new(asha()),
            submitting: AtomicBool::new(false),
        };

        let abandoned =
            tokio::time::timeout(std::time::Duration::from_millis(50), session.submit(&StalledApi))
                .await;
        assert!(abandoned.is_err());
        assert!(!session.is_submitting());
        assert_eq!(session.view().await.draft.name, "Asha");

        let api = FakeApi::default();
        assert_eq!(session.submit(&api).await, SubmitOutcome::Saved(SAVED.to_string()));
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn record_tags_read_shelter_flag() {
        let record = AssessmentRecord {
            living_temporary_shelter: true,
            enough_daily_food: Some("NO".into()),
            ..AssessmentRecord::default()
        };
        assert_eq!(
            summary_tags(TagFlags::from_record(&record)),
            vec!["In temporary shelter", "Not enough food"]
        );
    }
}
