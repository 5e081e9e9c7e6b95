use std::sync::Arc;

use crate::attendance::engine::AttendanceEngine;
use crate::attendance::reconciler::AbsenceReconciler;
use crate::clock::Clock;
use crate::report::service::ReportService;
use crate::store::{AttendanceStore, EmployeeDirectory, ReportStore};

/// Services shared by every worker.
pub struct AppState {
    pub attendance: AttendanceEngine,
    pub reconciler: Arc<AbsenceReconciler>,
    pub reports: ReportService,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        attendance_store: Arc<dyn AttendanceStore>,
        report_store: Arc<dyn ReportStore>,
        directory: Arc<dyn EmployeeDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            attendance: AttendanceEngine::new(
                attendance_store.clone(),
                directory.clone(),
                clock.clone(),
            ),
            reconciler: Arc::new(AbsenceReconciler::new(
                attendance_store.clone(),
                directory.clone(),
            )),
            reports: ReportService::new(attendance_store, report_store, directory, clock.clone()),
            clock,
        }
    }
}
