//! Validation utilities for the Inventory Purchasing Platform

use chrono::NaiveDate;

// ============================================================================
// Purchase Order Validations
// ============================================================================

/// Validate supplier name is present
pub fn validate_supplier(supplier: &str) -> Result<(), &'static str> {
    if supplier.trim().is_empty() {
        return Err("Supplier name is required");
    }
    if supplier.len() > 200 {
        return Err("Supplier name must be at most 200 characters");
    }
    Ok(())
}

/// Validate ordered quantity is positive
pub fn validate_order_quantity(quantity: u32) -> Result<(), &'static str> {
    if quantity == 0 {
        return Err("Ordered quantity must be at least 1");
    }
    Ok(())
}

/// Build an order number from prefix, order creation date and a store sequence.
/// e.g. ("PO", 2024-12-23, 42) -> "PO20241223-000042"
pub fn format_order_number(prefix: &str, date: NaiveDate, sequence: i64) -> String {
    format!("{}{}-{:06}", prefix, date.format("%Y%m%d"), sequence)
}

/// Validate order number format (prefix, 8-digit date, dash, 6+ digit sequence)
pub fn validate_order_number(number: &str, prefix: &str) -> Result<(), &'static str> {
    let rest = number
        .strip_prefix(prefix)
        .ok_or("Order number has the wrong prefix")?;
    let (date, sequence) = rest
        .split_once('-')
        .ok_or("Order number must contain a sequence")?;

    if NaiveDate::parse_from_str(date, "%Y%m%d").is_err() {
        return Err("Order number must contain a valid date");
    }
    if sequence.len() < 6 || !sequence.chars().all(|c| c.is_ascii_digit()) {
        return Err("Order number sequence must be at least 6 digits");
    }
    Ok(())
}

// ============================================================================
// Item Validations
// ============================================================================

/// Validate item code (SKU): non-empty, no whitespace
pub fn validate_item_code(code: &str) -> Result<(), &'static str> {
    if code.is_empty() {
        return Err("Item code is required");
    }
    if code.len() > 50 {
        return Err("Item code must be at most 50 characters");
    }
    if code.chars().any(char::is_whitespace) {
        return Err("Item code must not contain whitespace");
    }
    Ok(())
}

/// Validate stock quantity is not negative
pub fn validate_stock_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity < 0 {
        return Err("Stock quantity cannot be negative");
    }
    Ok(())
}
