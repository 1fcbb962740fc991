use crate::identity::Role;

/// Everything a protected endpoint may ask of the caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewProfile,
    /// Create bookings, manage participants, pay and cancel.
    ManageOwnBookings,
    SubmitCheckIn,
    ViewClimberDashboard,
    EditOwnProfile,
    ViewStaffDashboard,
    ReviewBookings,
    ReviewCheckIns,
    ScanCredentials,
    ViewReports,
}

impl Role {
    pub fn can(&self, capability: Capability) -> bool {
        use Capability::*;

        match self {
            Role::Climber => matches!(
                capability,
                ViewProfile | ManageOwnBookings | SubmitCheckIn | ViewClimberDashboard | EditOwnProfile
            ),
            Role::Staff => matches!(
                capability,
                ViewProfile | ViewStaffDashboard | ReviewBookings | ReviewCheckIns | ScanCredentials | ViewReports
            ),
        }
    }

    /// Where a freshly signed-in user lands.
    pub fn home(&self) -> &'static str {
        match self {
            Role::Climber => "/",
            Role::Staff => "/dashboard/admin",
        }
    }
}
