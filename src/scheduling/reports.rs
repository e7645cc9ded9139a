//! 인스턴스별 보고서 작성 현황 계산

use crate::models::{AbsenceStatus, ReportStatus};
use std::collections::{HashMap, HashSet};

/// 학생마다: 출결이 미확인이면 완료될 수 없고, 결석이면 보고서가 필요 없으며,
/// 그 밖에는 보고서가 있어야 완료입니다.
pub fn report_status(
    student_ids: &[String],
    absences: &HashMap<String, AbsenceStatus>,
    reported_students: &HashSet<String>,
) -> ReportStatus {
    let mut status = ReportStatus {
        total_students: student_ids.len(),
        ..ReportStatus::default()
    };
    let mut done = 0;

    for student_id in student_ids {
        let reported = reported_students.contains(student_id);
        if reported {
            status.completed_reports += 1;
        }
        match absences.get(student_id) {
            Some(AbsenceStatus::Unconfirmed) => status.pending_absences += 1,
            Some(AbsenceStatus::Absent) => {
                status.absences += 1;
                done += 1;
            }
            Some(AbsenceStatus::Present) | None => {
                if reported {
                    done += 1;
                }
            }
        }
    }

    status.all_reports_completed = status.pending_absences == 0 && done == student_ids.len();
    status
}
