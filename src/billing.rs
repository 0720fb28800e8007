//! Invoicing.
//!
//! Every monetary field on a billing is derived: lines give the
//! subtotal, the discount comes off, tax applies to what remains, and
//! the balance is total minus payments. Mutations recompute the whole
//! block; nothing writes a derived column directly. Payments can never
//! push the paid amount past the total.

use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{appointment, audit, billing, doctor, sequence};
use crate::error::ClinicError;
use crate::models::enums::{BillingState, PaymentMethod, PaymentStatus, ServiceType};
use crate::models::{Billing, BillingLine};

/// Monetary comparisons tolerate float noise up to a tenth of a cent.
const AMOUNT_EPSILON: f64 = 0.001;

/// Payment status is a pure function of (paid, total).
pub fn payment_status_for(paid: f64, total: f64) -> PaymentStatus {
    if total <= AMOUNT_EPSILON || paid <= AMOUNT_EPSILON {
        PaymentStatus::Unpaid
    } else if paid + AMOUNT_EPSILON >= total {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    }
}

/// Recompute the derived amount block from the lines:
/// subtotal -> discount -> tax on the discounted base -> total -> balance.
pub fn compute_amounts(billing: &mut Billing, lines: &[BillingLine]) {
    billing.subtotal = lines.iter().map(|l| l.subtotal).sum();
    billing.discount_amount = billing.subtotal * billing.discount_percent / 100.0;
    let taxable = billing.subtotal - billing.discount_amount;
    billing.tax_amount = taxable * billing.tax_percent / 100.0;
    billing.total_amount = taxable + billing.tax_amount;
    billing.balance_amount = billing.total_amount - billing.paid_amount;
    billing.payment_status = payment_status_for(billing.paid_amount, billing.total_amount);
}

#[derive(Debug, Clone)]
pub struct NewBilling {
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub appointment_id: Option<Uuid>,
    pub medical_record_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub discount_percent: f64,
    pub tax_percent: f64,
    pub notes: Option<String>,
}

impl NewBilling {
    pub fn new(patient_id: Uuid) -> Self {
        Self {
            patient_id,
            doctor_id: None,
            appointment_id: None,
            medical_record_id: None,
            due_date: None,
            discount_percent: 0.0,
            tax_percent: 0.0,
            notes: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewBillingLine {
    pub service_type: ServiceType,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub notes: Option<String>,
}

impl NewBillingLine {
    pub fn new(
        service_type: ServiceType,
        description: impl Into<String>,
        quantity: f64,
        unit_price: f64,
    ) -> Self {
        Self {
            service_type,
            description: description.into(),
            quantity,
            unit_price,
            notes: None,
        }
    }
}

/// Open an invoice, dated today. Linking an appointment seeds a
/// consultation-fee line for its doctor.
pub fn create_billing(conn: &Connection, req: &NewBilling) -> Result<Billing, ClinicError> {
    create_billing_on(conn, req, Local::now().date_naive())
}

pub(crate) fn create_billing_on(
    conn: &Connection,
    req: &NewBilling,
    billing_date: NaiveDate,
) -> Result<Billing, ClinicError> {
    check_percent(req.discount_percent, "Discount")?;
    check_percent(req.tax_percent, "Tax")?;

    let tx = conn.unchecked_transaction()?;
    let mut bill = Billing {
        id: Uuid::new_v4(),
        reference: sequence::next_reference(&tx, "billing")?,
        patient_id: req.patient_id,
        doctor_id: req.doctor_id,
        appointment_id: req.appointment_id,
        medical_record_id: req.medical_record_id,
        billing_date,
        due_date: req.due_date,
        discount_percent: req.discount_percent,
        tax_percent: req.tax_percent,
        subtotal: 0.0,
        discount_amount: 0.0,
        tax_amount: 0.0,
        total_amount: 0.0,
        paid_amount: 0.0,
        balance_amount: 0.0,
        payment_method: None,
        payment_status: PaymentStatus::Unpaid,
        state: BillingState::Draft,
        notes: req.notes.clone(),
        active: true,
    };

    let mut lines = Vec::new();
    if let Some(appointment_id) = &req.appointment_id {
        let appt = appointment::get_appointment(&tx, appointment_id)?;
        let doc = doctor::get_doctor(&tx, &appt.doctor_id)?;
        bill.doctor_id.get_or_insert(appt.doctor_id);
        lines.push(BillingLine {
            id: Uuid::new_v4(),
            billing_id: bill.id,
            sequence: 10,
            service_type: ServiceType::Consultation,
            description: format!("Consultation - {}", doc.name),
            quantity: 1.0,
            unit_price: doc.consultation_fee,
            subtotal: doc.consultation_fee,
            notes: None,
        });
    }

    compute_amounts(&mut bill, &lines);
    billing::insert_billing(&tx, &bill)?;
    for line in &lines {
        billing::insert_billing_line(&tx, line)?;
    }
    audit::log_note(&tx, "billing", &bill.id, "Billing created.")?;
    tx.commit()?;
    Ok(bill)
}

pub fn add_line(
    conn: &Connection,
    billing_id: &Uuid,
    req: &NewBillingLine,
) -> Result<Billing, ClinicError> {
    if req.quantity <= 0.0 {
        return Err(ClinicError::validation(
            "Line quantity must be greater than zero!",
        ));
    }
    if req.unit_price < 0.0 {
        return Err(ClinicError::validation("Unit price cannot be negative!"));
    }

    let tx = conn.unchecked_transaction()?;
    let mut bill = billing::get_billing(&tx, billing_id)?;
    check_mutable(&bill)?;

    let sequence = (billing::line_count(&tx, billing_id)? + 1) * 10;
    let line = BillingLine {
        id: Uuid::new_v4(),
        billing_id: *billing_id,
        sequence,
        service_type: req.service_type,
        description: req.description.clone(),
        quantity: req.quantity,
        unit_price: req.unit_price,
        subtotal: req.quantity * req.unit_price,
        notes: req.notes.clone(),
    };
    billing::insert_billing_line(&tx, &line)?;

    let lines = billing::billing_lines(&tx, billing_id)?;
    compute_amounts(&mut bill, &lines);
    billing::update_amounts(&tx, &bill)?;
    tx.commit()?;
    Ok(bill)
}

/// Remove a line, unless payments already received would then exceed
/// the shrunken total.
pub fn remove_line(
    conn: &Connection,
    billing_id: &Uuid,
    line_id: &Uuid,
) -> Result<Billing, ClinicError> {
    let tx = conn.unchecked_transaction()?;
    let mut bill = billing::get_billing(&tx, billing_id)?;
    check_mutable(&bill)?;

    billing::delete_billing_line(&tx, line_id)?;
    let lines = billing::billing_lines(&tx, billing_id)?;
    compute_amounts(&mut bill, &lines);
    if bill.paid_amount > bill.total_amount + AMOUNT_EPSILON {
        return Err(ClinicError::validation(
            "Paid amount cannot exceed the total amount!",
        ));
    }
    billing::update_amounts(&tx, &bill)?;
    tx.commit()?;
    Ok(bill)
}

pub fn set_discount(
    conn: &Connection,
    billing_id: &Uuid,
    percent: f64,
) -> Result<Billing, ClinicError> {
    check_percent(percent, "Discount")?;
    adjust(conn, billing_id, |bill| bill.discount_percent = percent)
}

pub fn set_tax(conn: &Connection, billing_id: &Uuid, percent: f64) -> Result<Billing, ClinicError> {
    check_percent(percent, "Tax")?;
    adjust(conn, billing_id, |bill| bill.tax_percent = percent)
}

/// Record a payment. The invoice flips to paid automatically once the
/// balance reaches zero on a confirmed invoice.
pub fn register_payment(
    conn: &Connection,
    billing_id: &Uuid,
    amount: f64,
    method: Option<PaymentMethod>,
) -> Result<Billing, ClinicError> {
    if amount <= 0.0 {
        return Err(ClinicError::validation(
            "Payment amount must be greater than zero!",
        ));
    }

    let tx = conn.unchecked_transaction()?;
    let mut bill = billing::get_billing(&tx, billing_id)?;
    if matches!(bill.state, BillingState::Cancelled) {
        return Err(ClinicError::validation(
            "Cannot register a payment on a cancelled billing!",
        ));
    }
    if bill.paid_amount + amount > bill.total_amount + AMOUNT_EPSILON {
        return Err(ClinicError::validation(
            "Paid amount cannot exceed the total amount!",
        ));
    }

    bill.paid_amount += amount;
    let lines = billing::billing_lines(&tx, billing_id)?;
    compute_amounts(&mut bill, &lines);
    billing::update_amounts(&tx, &bill)?;
    if let Some(method) = method {
        billing::set_payment_method(&tx, billing_id, method)?;
        bill.payment_method = Some(method);
    }
    audit::log_note(
        &tx,
        "billing",
        billing_id,
        &format!("Payment of {amount:.2} registered."),
    )?;

    if bill.payment_status == PaymentStatus::Paid && bill.state == BillingState::Confirmed {
        billing::set_billing_state(&tx, billing_id, BillingState::Paid)?;
        bill.state = BillingState::Paid;
        audit::log_note(&tx, "billing", billing_id, "Billing fully paid.")?;
    }
    tx.commit()?;
    Ok(bill)
}

/// Confirm a draft invoice. An invoice with nothing on it cannot be
/// confirmed.
pub fn confirm_billing(conn: &Connection, billing_id: &Uuid) -> Result<Billing, ClinicError> {
    let bill = billing::get_billing(conn, billing_id)?;
    if bill.state != BillingState::Draft {
        return Ok(bill);
    }
    if billing::line_count(conn, billing_id)? == 0 {
        return Err(ClinicError::validation(
            "Please add at least one billing line!",
        ));
    }
    let tx = conn.unchecked_transaction()?;
    billing::set_billing_state(&tx, billing_id, BillingState::Confirmed)?;
    audit::log_note(&tx, "billing", billing_id, "Billing confirmed.")?;
    tx.commit()?;
    billing::get_billing(conn, billing_id).map_err(Into::into)
}

/// Settle a confirmed invoice in full in one step.
pub fn mark_paid(conn: &Connection, billing_id: &Uuid) -> Result<Billing, ClinicError> {
    let mut bill = billing::get_billing(conn, billing_id)?;
    if bill.state != BillingState::Confirmed {
        return Ok(bill);
    }
    let tx = conn.unchecked_transaction()?;
    bill.paid_amount = bill.total_amount;
    let lines = billing::billing_lines(&tx, billing_id)?;
    compute_amounts(&mut bill, &lines);
    billing::update_amounts(&tx, &bill)?;
    billing::set_billing_state(&tx, billing_id, BillingState::Paid)?;
    audit::log_note(&tx, "billing", billing_id, "Billing fully paid.")?;
    tx.commit()?;
    billing::get_billing(conn, billing_id).map_err(Into::into)
}

/// Cancel unless already settled. Cancelling twice is a no-op.
pub fn cancel_billing(conn: &Connection, billing_id: &Uuid) -> Result<Billing, ClinicError> {
    let bill = billing::get_billing(conn, billing_id)?;
    if matches!(bill.state, BillingState::Paid | BillingState::Cancelled) {
        return Ok(bill);
    }
    let tx = conn.unchecked_transaction()?;
    billing::set_billing_state(&tx, billing_id, BillingState::Cancelled)?;
    audit::log_note(&tx, "billing", billing_id, "Billing cancelled.")?;
    tx.commit()?;
    billing::get_billing(conn, billing_id).map_err(Into::into)
}

/// Unconditional return to draft.
pub fn reset_billing(conn: &Connection, billing_id: &Uuid) -> Result<Billing, ClinicError> {
    let tx = conn.unchecked_transaction()?;
    billing::set_billing_state(&tx, billing_id, BillingState::Draft)?;
    audit::log_note(&tx, "billing", billing_id, "Billing reset to draft.")?;
    tx.commit()?;
    billing::get_billing(conn, billing_id).map_err(Into::into)
}

fn adjust(
    conn: &Connection,
    billing_id: &Uuid,
    apply: impl FnOnce(&mut Billing),
) -> Result<Billing, ClinicError> {
    let tx = conn.unchecked_transaction()?;
    let mut bill = billing::get_billing(&tx, billing_id)?;
    check_mutable(&bill)?;

    apply(&mut bill);
    let lines = billing::billing_lines(&tx, billing_id)?;
    compute_amounts(&mut bill, &lines);
    if bill.paid_amount > bill.total_amount + AMOUNT_EPSILON {
        return Err(ClinicError::validation(
            "Paid amount cannot exceed the total amount!",
        ));
    }
    billing::update_amounts(&tx, &bill)?;
    tx.commit()?;
    Ok(bill)
}

fn check_mutable(bill: &Billing) -> Result<(), ClinicError> {
    if matches!(bill.state, BillingState::Paid | BillingState::Cancelled) {
        return Err(ClinicError::validation(
            "A paid or cancelled billing cannot be modified!",
        ));
    }
    Ok(())
}

fn check_percent(percent: f64, what: &str) -> Result<(), ClinicError> {
    if !(0.0..=100.0).contains(&percent) {
        return Err(ClinicError::validation(format!(
            "{what} percent must be between 0 and 100!"
        )));
    }
    Ok(())
}
