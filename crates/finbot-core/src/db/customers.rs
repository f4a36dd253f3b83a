//! Customer operations

use rusqlite::{params, OptionalExtension};

use super::{date_column, Database};
use crate::error::Result;
use crate::models::Customer;

const CUSTOMER_COLUMNS: &str = "customer_id, first_name, last_name, email, phone, \
     date_of_birth, gender, city, registration_date";

fn customer_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        customer_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        date_of_birth: date_column(row, 5)?,
        gender: row.get(6)?,
        city: row.get(7)?,
        registration_date: date_column(row, 8)?,
    })
}

impl Database {
    /// Lowest customer id, used when a request names no customer
    pub fn first_customer_id(&self) -> Result<Option<i64>> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT customer_id FROM customers ORDER BY customer_id LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Get a customer by ID
    pub fn get_customer(&self, customer_id: i64) -> Result<Option<Customer>> {
        let conn = self.conn()?;
        let customer = conn
            .query_row(
                &format!(
                    "SELECT {} FROM customers WHERE customer_id = ?",
                    CUSTOMER_COLUMNS
                ),
                params![customer_id],
                customer_from_row,
            )
            .optional()?;
        Ok(customer)
    }

    /// List all customers
    pub fn list_customers(&self) -> Result<Vec<Customer>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM customers ORDER BY customer_id",
            CUSTOMER_COLUMNS
        ))?;

        let customers = stmt
            .query_map([], customer_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(customers)
    }

    /// Insert (or replace) a customer with an explicit id
    pub fn insert_customer(&self, customer: &Customer) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO customers
                (customer_id, first_name, last_name, email, phone,
                 date_of_birth, gender, city, registration_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                customer.customer_id,
                customer.first_name,
                customer.last_name,
                customer.email,
                customer.phone,
                customer.date_of_birth.map(|d| d.to_string()),
                customer.gender,
                customer.city,
                customer.registration_date.map(|d| d.to_string()),
            ],
        )?;
        Ok(())
    }
}
