use crate::client::AssessmentApi;
use crate::dashboard::DashboardSession;
use crate::form::FormSession;
use chrono::NaiveDate;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn AssessmentApi>,
    pub form: Arc<FormSession>,
    pub dashboard: Arc<DashboardSession>,
}

impl AppState {
    pub fn new(api: Arc<dyn AssessmentApi>, collection_date: NaiveDate) -> Self {
        Self {
            api,
            form: Arc::new(FormSession::new()),
            dashboard: Arc::new(DashboardSession::new(collection_date)),
        }
    }
}
