//! Static role/permission table.

use std::fmt;
use std::str::FromStr;

use crate::auth::Role;

const ADMIN_ONLY: &[Role] = &[Role::Administrator];
const STAFF: &[Role] = &[Role::Administrator, Role::Doctor];
const DOCTOR_ONLY: &[Role] = &[Role::Doctor];
const PATIENT_ONLY: &[Role] = &[Role::Patient];
const EVERYONE: &[Role] = &[Role::Administrator, Role::Doctor, Role::Patient];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ManageUsers,
    ViewPatients,
    ManagePatients,
    DeletePatients,
    ViewOwnRecords,
    BookAppointment,
    ManageAppointments,
    DeleteAppointments,
    ManageAvailability,
    ViewAvailability,
    WriteMedicalNotes,
    ReadMedicalNotes,
    ManageFaq,
    AskQuestion,
    ViewStatistics,
    ManageOwnSettings,
}

impl Permission {
    pub const ALL: [Permission; 16] = [
        Permission::ManageUsers,
        Permission::ViewPatients,
        Permission::ManagePatients,
        Permission::DeletePatients,
        Permission::ViewOwnRecords,
        Permission::BookAppointment,
        Permission::ManageAppointments,
        Permission::DeleteAppointments,
        Permission::ManageAvailability,
        Permission::ViewAvailability,
        Permission::WriteMedicalNotes,
        Permission::ReadMedicalNotes,
        Permission::ManageFaq,
        Permission::AskQuestion,
        Permission::ViewStatistics,
        Permission::ManageOwnSettings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageUsers => "manage_users",
            Permission::ViewPatients => "view_patients",
            Permission::ManagePatients => "manage_patients",
            Permission::DeletePatients => "delete_patients",
            Permission::ViewOwnRecords => "view_own_records",
            Permission::BookAppointment => "book_appointment",
            Permission::ManageAppointments => "manage_appointments",
            Permission::DeleteAppointments => "delete_appointments",
            Permission::ManageAvailability => "manage_availability",
            Permission::ViewAvailability => "view_availability",
            Permission::WriteMedicalNotes => "write_medical_notes",
            Permission::ReadMedicalNotes => "read_medical_notes",
            Permission::ManageFaq => "manage_faq",
            Permission::AskQuestion => "ask_question",
            Permission::ViewStatistics => "view_statistics",
            Permission::ManageOwnSettings => "manage_own_settings",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|permission| permission.as_str() == s)
            .ok_or_else(|| format!("Unknown permission: {}", s))
    }
}

/// Roles allowed to exercise `permission`.
pub fn roles_for(permission: Permission) -> &'static [Role] {
    match permission {
        Permission::ManageUsers => ADMIN_ONLY,
        Permission::ViewPatients => STAFF,
        Permission::ManagePatients => STAFF,
        Permission::DeletePatients => ADMIN_ONLY,
        Permission::ViewOwnRecords => PATIENT_ONLY,
        Permission::BookAppointment => EVERYONE,
        Permission::ManageAppointments => STAFF,
        Permission::DeleteAppointments => ADMIN_ONLY,
        Permission::ManageAvailability => STAFF,
        Permission::ViewAvailability => EVERYONE,
        Permission::WriteMedicalNotes => DOCTOR_ONLY,
        Permission::ReadMedicalNotes => STAFF,
        Permission::ManageFaq => ADMIN_ONLY,
        Permission::AskQuestion => EVERYONE,
        Permission::ViewStatistics => ADMIN_ONLY,
        Permission::ManageOwnSettings => EVERYONE,
    }
}

pub fn is_admin(role: Role) -> bool {
    role == Role::Administrator
}

pub fn has_permission(role: Role, permission: Permission) -> bool {
    roles_for(permission).contains(&role)
}

pub fn user_has_all_permissions(role: Role, permissions: &[Permission]) -> bool {
    permissions.iter().all(|permission| has_permission(role, *permission))
}

pub fn user_has_any_permission(role: Role, permissions: &[Permission]) -> bool {
    permissions.iter().any(|permission| has_permission(role, *permission))
}

/// Every permission granted to `role`, in table order.
pub fn permissions_for(role: Role) -> Vec<Permission> {
    Permission::ALL
        .iter()
        .copied()
        .filter(|permission| has_permission(role, *permission))
        .collect()
}
