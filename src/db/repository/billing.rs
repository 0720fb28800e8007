use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{BillingState, PaymentMethod, PaymentStatus, ServiceType};
use crate::models::{Billing, BillingLine};

use super::{parse_date, parse_opt_date, parse_opt_uuid, parse_uuid};

const COLUMNS: &str = "id, reference, patient_id, doctor_id, appointment_id, \
     medical_record_id, billing_date, due_date, discount_percent, tax_percent, \
     subtotal, discount_amount, tax_amount, total_amount, paid_amount, \
     balance_amount, payment_method, payment_status, state, notes, active";

pub fn insert_billing(conn: &Connection, billing: &Billing) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO billings (id, reference, patient_id, doctor_id, appointment_id,
         medical_record_id, billing_date, due_date, discount_percent, tax_percent,
         subtotal, discount_amount, tax_amount, total_amount, paid_amount,
         balance_amount, payment_method, payment_status, state, notes, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                 ?16, ?17, ?18, ?19, ?20, ?21)",
        params![
            billing.id.to_string(),
            billing.reference,
            billing.patient_id.to_string(),
            billing.doctor_id.map(|id| id.to_string()),
            billing.appointment_id.map(|id| id.to_string()),
            billing.medical_record_id.map(|id| id.to_string()),
            billing.billing_date.to_string(),
            billing.due_date.map(|d| d.to_string()),
            billing.discount_percent,
            billing.tax_percent,
            billing.subtotal,
            billing.discount_amount,
            billing.tax_amount,
            billing.total_amount,
            billing.paid_amount,
            billing.balance_amount,
            billing.payment_method.map(|m| m.as_str()),
            billing.payment_status.as_str(),
            billing.state.as_str(),
            billing.notes,
            billing.active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_billing(conn: &Connection, id: &Uuid) -> Result<Billing, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM billings WHERE id = ?1"),
            params![id.to_string()],
            billing_row,
        )
        .optional()?;
    match raw {
        Some(raw) => billing_from_row(raw),
        None => Err(DatabaseError::NotFound {
            entity_type: "Billing".into(),
            id: id.to_string(),
        }),
    }
}

/// Persist the derived amount block in one statement. The calculator is
/// the only writer of these columns.
pub fn update_amounts(conn: &Connection, billing: &Billing) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE billings
         SET discount_percent = ?1, tax_percent = ?2, subtotal = ?3,
             discount_amount = ?4, tax_amount = ?5, total_amount = ?6,
             paid_amount = ?7, balance_amount = ?8, payment_status = ?9
         WHERE id = ?10",
        params![
            billing.discount_percent,
            billing.tax_percent,
            billing.subtotal,
            billing.discount_amount,
            billing.tax_amount,
            billing.total_amount,
            billing.paid_amount,
            billing.balance_amount,
            billing.payment_status.as_str(),
            billing.id.to_string(),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Billing".into(),
            id: billing.id.to_string(),
        });
    }
    Ok(())
}

pub fn set_billing_state(
    conn: &Connection,
    id: &Uuid,
    state: BillingState,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE billings SET state = ?1 WHERE id = ?2",
        params![state.as_str(), id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Billing".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn set_payment_method(
    conn: &Connection,
    id: &Uuid,
    method: PaymentMethod,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE billings SET payment_method = ?1 WHERE id = ?2",
        params![method.as_str(), id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Billing".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn insert_billing_line(conn: &Connection, line: &BillingLine) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO billing_lines (id, billing_id, sequence, service_type,
         description, quantity, unit_price, subtotal, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            line.id.to_string(),
            line.billing_id.to_string(),
            line.sequence,
            line.service_type.as_str(),
            line.description,
            line.quantity,
            line.unit_price,
            line.subtotal,
            line.notes,
        ],
    )?;
    Ok(())
}

pub fn delete_billing_line(conn: &Connection, line_id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM billing_lines WHERE id = ?1",
        params![line_id.to_string()],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "BillingLine".into(),
            id: line_id.to_string(),
        });
    }
    Ok(())
}

pub fn billing_lines(conn: &Connection, billing_id: &Uuid) -> Result<Vec<BillingLine>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, billing_id, sequence, service_type, description, quantity,
                unit_price, subtotal, notes
         FROM billing_lines WHERE billing_id = ?1
         ORDER BY sequence, id",
    )?;
    let rows = stmt.query_map(params![billing_id.to_string()], billing_line_row)?;

    let mut lines = Vec::new();
    for row in rows {
        lines.push(billing_line_from_row(row?)?);
    }
    Ok(lines)
}

pub fn line_count(conn: &Connection, billing_id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM billing_lines WHERE billing_id = ?1",
        params![billing_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

struct BillingRow {
    id: String,
    reference: String,
    patient_id: String,
    doctor_id: Option<String>,
    appointment_id: Option<String>,
    medical_record_id: Option<String>,
    billing_date: String,
    due_date: Option<String>,
    discount_percent: f64,
    tax_percent: f64,
    subtotal: f64,
    discount_amount: f64,
    tax_amount: f64,
    total_amount: f64,
    paid_amount: f64,
    balance_amount: f64,
    payment_method: Option<String>,
    payment_status: String,
    state: String,
    notes: Option<String>,
    active: i32,
}

fn billing_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BillingRow> {
    Ok(BillingRow {
        id: row.get(0)?,
        reference: row.get(1)?,
        patient_id: row.get(2)?,
        doctor_id: row.get(3)?,
        appointment_id: row.get(4)?,
        medical_record_id: row.get(5)?,
        billing_date: row.get(6)?,
        due_date: row.get(7)?,
        discount_percent: row.get(8)?,
        tax_percent: row.get(9)?,
        subtotal: row.get(10)?,
        discount_amount: row.get(11)?,
        tax_amount: row.get(12)?,
        total_amount: row.get(13)?,
        paid_amount: row.get(14)?,
        balance_amount: row.get(15)?,
        payment_method: row.get(16)?,
        payment_status: row.get(17)?,
        state: row.get(18)?,
        notes: row.get(19)?,
        active: row.get(20)?,
    })
}

fn billing_from_row(row: BillingRow) -> Result<Billing, DatabaseError> {
    let payment_method = match row.payment_method {
        Some(raw) => Some(PaymentMethod::from_str(&raw)?),
        None => None,
    };
    Ok(Billing {
        id: parse_uuid(&row.id)?,
        reference: row.reference,
        patient_id: parse_uuid(&row.patient_id)?,
        doctor_id: parse_opt_uuid(row.doctor_id),
        appointment_id: parse_opt_uuid(row.appointment_id),
        medical_record_id: parse_opt_uuid(row.medical_record_id),
        billing_date: parse_date(&row.billing_date)?,
        due_date: parse_opt_date(row.due_date),
        discount_percent: row.discount_percent,
        tax_percent: row.tax_percent,
        subtotal: row.subtotal,
        discount_amount: row.discount_amount,
        tax_amount: row.tax_amount,
        total_amount: row.total_amount,
        paid_amount: row.paid_amount,
        balance_amount: row.balance_amount,
        payment_method,
        payment_status: PaymentStatus::from_str(&row.payment_status)?,
        state: BillingState::from_str(&row.state)?,
        notes: row.notes,
        active: row.active != 0,
    })
}

struct BillingLineRow {
    id: String,
    billing_id: String,
    sequence: i64,
    service_type: String,
    description: String,
    quantity: f64,
    unit_price: f64,
    subtotal: f64,
    notes: Option<String>,
}

fn billing_line_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BillingLineRow> {
    Ok(BillingLineRow {
        id: row.get(0)?,
        billing_id: row.get(1)?,
        sequence: row.get(2)?,
        service_type: row.get(3)?,
        description: row.get(4)?,
        quantity: row.get(5)?,
        unit_price: row.get(6)?,
        subtotal: row.get(7)?,
        notes: row.get(8)?,
    })
}

fn billing_line_from_row(row: BillingLineRow) -> Result<BillingLine, DatabaseError> {
    Ok(BillingLine {
        id: parse_uuid(&row.id)?,
        billing_id: parse_uuid(&row.billing_id)?,
        sequence: row.sequence,
        service_type: ServiceType::from_str(&row.service_type)?,
        description: row.description,
        quantity: row.quantity,
        unit_price: row.unit_price,
        subtotal: row.subtotal,
        notes: row.notes,
    })
}
