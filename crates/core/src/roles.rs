//! Well-known technician assignment values.
//!
//! Must match the column default in `20261001000002_create_tickets_table.sql`.

/// Placeholder `tech` value for tickets nobody has picked up yet.
pub const UNASSIGNED_TECH: &str = "unassigned";

/// Returns `true` if the ticket's `tech` column names a real technician.
pub fn is_assigned(tech: &str) -> bool {
    !tech.is_empty() && !tech.eq_ignore_ascii_case(UNASSIGNED_TECH)
}
