//! Diesel ORM records for database tables.
//!
//! Timestamps are RFC 3339 text and analysis lists are JSON text so the same
//! schema works on SQLite and PostgreSQL.

use diesel::prelude::*;

use crate::schema;

/// User record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::users)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    pub api_token: String,
    pub plan: String,
    pub documents_processed_this_month: i32,
    pub subscription_status: String,
    pub billing_customer_id: Option<String>,
    pub billing_subscription_id: Option<String>,
    pub subscription_end_date: Option<String>,
    pub created_at: String,
}

/// New user for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::users)]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub api_token: &'a str,
    pub plan: &'a str,
    pub documents_processed_this_month: i32,
    pub subscription_status: &'a str,
    pub billing_customer_id: Option<&'a str>,
    pub billing_subscription_id: Option<&'a str>,
    pub subscription_end_date: Option<&'a str>,
    pub created_at: &'a str,
}

/// Document record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::documents)]
pub struct DocumentRecord {
    pub id: String,
    pub user_id: String,
    pub filename: String,
    pub file_path: String,
    pub mime_type: String,
    pub file_size: i64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// New document for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::documents)]
pub struct NewDocument<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub filename: &'a str,
    pub file_path: &'a str,
    pub mime_type: &'a str,
    pub file_size: i64,
    pub status: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Analysis record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::analyses)]
#[diesel(primary_key(document_id))]
pub struct AnalysisRecord {
    pub document_id: String,
    pub summary: String,
    pub parties: String,
    pub dates: String,
    pub financial_terms: String,
    pub obligations: String,
    pub risks: String,
    pub termination_conditions: String,
    pub confidence_score: f64,
    pub created_at: String,
}

/// New analysis for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::analyses)]
pub struct NewAnalysis<'a> {
    pub document_id: &'a str,
    pub summary: &'a str,
    pub parties: &'a str,
    pub dates: &'a str,
    pub financial_terms: &'a str,
    pub obligations: &'a str,
    pub risks: &'a str,
    pub termination_conditions: &'a str,
    pub confidence_score: f64,
    pub created_at: &'a str,
}
