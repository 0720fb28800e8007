use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{BillingState, PaymentMethod, PaymentStatus, ServiceType};

/// An invoice. All monetary fields below `tax_percent` are derived and
/// recomputed by the billing calculator on every mutation; nothing ever
/// writes them independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Billing {
    pub id: Uuid,
    pub reference: String,
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub appointment_id: Option<Uuid>,
    pub medical_record_id: Option<Uuid>,
    pub billing_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub discount_percent: f64,
    pub tax_percent: f64,
    pub subtotal: f64,
    pub discount_amount: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub balance_amount: f64,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    pub state: BillingState,
    pub notes: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingLine {
    pub id: Uuid,
    pub billing_id: Uuid,
    pub sequence: i64,
    pub service_type: ServiceType,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub subtotal: f64,
    pub notes: Option<String>,
}
