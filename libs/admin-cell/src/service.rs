use chrono::Local;
use tracing::debug;

use appointment_cell::AppointmentService;
use auth_cell::UserService;
use faq_cell::FaqService;
use patient_cell::ClientService;
use shared_database::AppState;

use crate::models::{AdminError, AdminStats};

pub struct DashboardService {
    users: UserService,
    clients: ClientService,
    appointments: AppointmentService,
    faqs: FaqService,
}

impl DashboardService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: UserService::new(state),
            clients: ClientService::new(state),
            appointments: AppointmentService::new(state),
            faqs: FaqService::new(state),
        }
    }

    pub async fn stats(&self) -> Result<AdminStats, AdminError> {
        let today = Local::now().date_naive();

        let stats = AdminStats {
            users_by_role: self.users.count_by_role().await?,
            total_patients: self.clients.count().await?,
            appointments_by_status: self.appointments.counts_by_status().await?,
            appointments_today: self.appointments.count_on(today).await?,
            upcoming_appointments: self.appointments.count_upcoming().await?,
            pending_questions: self.faqs.count_unanswered().await?,
        };

        debug!("Dashboard stats computed for {}", today);
        Ok(stats)
    }
}
