use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

str_enum!(Specialty {
    Cardiology => "cardiology",
    Pediatrics => "pediatrics",
    Neurology => "neurology",
    Orthopedics => "orthopedics",
    General => "general",
});

/// Binary busy/available signal derived from patient load.
str_enum!(Availability {
    Available => "available",
    Busy => "busy",
});

str_enum!(Priority {
    Normal => "normal",
    Low => "low",
    High => "high",
    VeryHigh => "very_high",
});

str_enum!(PatientState {
    New => "new",
    Waiting => "waiting",
    Consultation => "consultation",
    Done => "done",
    Cancelled => "cancelled",
});

str_enum!(AppointmentType {
    Consultation => "consultation",
    Followup => "followup",
    Checkup => "checkup",
    Emergency => "emergency",
});

str_enum!(AppointmentState {
    Draft => "draft",
    Confirmed => "confirmed",
    Arrived => "arrived",
    InProgress => "in_progress",
    Done => "done",
    Cancelled => "cancelled",
    NoShow => "no_show",
});

str_enum!(BillingState {
    Draft => "draft",
    Confirmed => "confirmed",
    Paid => "paid",
    Cancelled => "cancelled",
});

/// Derived purely from (paid, total); never set directly.
str_enum!(PaymentStatus {
    Unpaid => "unpaid",
    Partial => "partial",
    Paid => "paid",
});

str_enum!(PaymentMethod {
    Cash => "cash",
    Card => "card",
    BankTransfer => "bank_transfer",
    Insurance => "insurance",
    Online => "online",
});

str_enum!(ServiceType {
    Consultation => "consultation",
    LabTest => "lab_test",
    Xray => "xray",
    Scan => "scan",
    Surgery => "surgery",
    Medicine => "medicine",
    RoomCharge => "room_charge",
    Other => "other",
});

str_enum!(LabTestState {
    Draft => "draft",
    Requested => "requested",
    InProgress => "in_progress",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(ResultStatus {
    Normal => "normal",
    Abnormal => "abnormal",
    Critical => "critical",
});

str_enum!(LabPriority {
    Routine => "routine",
    Urgent => "urgent",
    Stat => "stat",
});

str_enum!(LabCategory {
    Hematology => "hematology",
    Biochemistry => "biochemistry",
    Microbiology => "microbiology",
    Serology => "serology",
    Urine => "urine",
    Hormone => "hormone",
    Immunology => "immunology",
    Pathology => "pathology",
    Radiology => "radiology",
    Other => "other",
});

str_enum!(RecordState {
    Draft => "draft",
    Confirmed => "confirmed",
    Archived => "archived",
});

str_enum!(RecordType {
    Consultation => "consultation",
    LabTest => "lab_test",
    Xray => "xray",
    Scan => "scan",
    Prescription => "prescription",
    Surgery => "surgery",
    FollowUp => "follow_up",
    Other => "other",
});

str_enum!(PrescriptionState {
    Draft => "draft",
    Confirmed => "confirmed",
    Dispensed => "dispensed",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(MedicineType {
    Tablet => "tablet",
    Capsule => "capsule",
    Syrup => "syrup",
    Injection => "injection",
    Cream => "cream",
    Drops => "drops",
    Inhaler => "inhaler",
    Other => "other",
});

str_enum!(DurationUnit {
    Days => "days",
    Weeks => "weeks",
    Months => "months",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn appointment_state_round_trip() {
        for (variant, s) in [
            (AppointmentState::Draft, "draft"),
            (AppointmentState::Confirmed, "confirmed"),
            (AppointmentState::Arrived, "arrived"),
            (AppointmentState::InProgress, "in_progress"),
            (AppointmentState::Done, "done"),
            (AppointmentState::Cancelled, "cancelled"),
            (AppointmentState::NoShow, "no_show"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(AppointmentState::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn payment_status_round_trip() {
        for (variant, s) in [
            (PaymentStatus::Unpaid, "unpaid"),
            (PaymentStatus::Partial, "partial"),
            (PaymentStatus::Paid, "paid"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(PaymentStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn result_status_round_trip() {
        for (variant, s) in [
            (ResultStatus::Normal, "normal"),
            (ResultStatus::Abnormal, "abnormal"),
            (ResultStatus::Critical, "critical"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ResultStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(AppointmentState::from_str("scheduled").is_err());
        assert!(BillingState::from_str("refunded").is_err());
        assert!(PaymentStatus::from_str("").is_err());
    }
}
