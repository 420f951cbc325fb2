//! Raw record normalization.
//!
//! The datastore hands over plain documents whose field names vary by kind
//! and by age of the data (`paymentDate` vs `date`, `driverId` vs
//! `subjectId`, ...). Every alias is resolved here, once, from an ordered
//! list; nothing downstream looks at raw field names.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    Diagnostic, EntryKind, LedgerEntry, LedgerError, MoneyCents, PaymentMethod, Reported,
    ResultLedger,
    util::{local_midnight, localize},
};

const ID_FIELDS: &[&str] = &["id", "_id"];
const AMOUNT_FIELDS: &[&str] = &["amount", "total"];
const PAYMENT_DATE_FIELDS: &[&str] = &["paymentDate", "payment_date", "date", "createdAt"];
const DATE_FIELDS: &[&str] = &["date", "createdAt"];
const DRIVER_FIELDS: &[&str] = &["subjectId", "driverId", "driver_id"];
const OWNER_FIELDS: &[&str] = &["subjectId", "ownerId", "owner_id"];
const VEHICLE_FIELDS: &[&str] = &["subjectId", "vehicleId", "vehicle_id"];
const METHOD_FIELDS: &[&str] = &["method", "paymentMethod", "payment_method"];
const DESCRIPTION_FIELDS: &[&str] = &["description", "concept", "note"];
const CATEGORY_FIELDS: &[&str] = &["category", "businessLine", "business_line"];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

fn date_fields(kind: EntryKind) -> &'static [&'static str] {
    match kind {
        EntryKind::Payment => PAYMENT_DATE_FIELDS,
        EntryKind::Charge | EntryKind::Debt | EntryKind::Withdrawal | EntryKind::Expense => {
            DATE_FIELDS
        }
    }
}

fn subject_fields(kind: EntryKind) -> &'static [&'static str] {
    match kind {
        EntryKind::Charge | EntryKind::Debt | EntryKind::Payment => DRIVER_FIELDS,
        EntryKind::Withdrawal => OWNER_FIELDS,
        EntryKind::Expense => VEHICLE_FIELDS,
    }
}

/// One document as stored by the datastore.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Builds a record from a JSON object; any other JSON value is an error.
    pub fn from_value(value: Value) -> ResultLedger<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// First alias that is present and carries a value. `null` and blank
    /// strings count as empty.
    fn first(&self, aliases: &[&str]) -> Option<&Value> {
        aliases
            .iter()
            .filter_map(|name| self.fields.get(*name))
            .find(|value| !is_empty(value))
    }

    /// Whether any alias is present at all, empty or not.
    fn has_any(&self, aliases: &[&str]) -> bool {
        aliases.iter().any(|name| self.fields.contains_key(*name))
    }

    fn text(&self, aliases: &[&str]) -> Option<String> {
        self.first(aliases).map(value_text)
    }
}

/// A record from a mixed feed that names its own kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaggedRecord {
    pub kind: String,
    #[serde(flatten)]
    pub record: RawRecord,
}

/// Full snapshot of the five source collections.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSnapshot {
    pub charges: Vec<RawRecord>,
    pub debts: Vec<RawRecord>,
    pub payments: Vec<RawRecord>,
    pub withdrawals: Vec<RawRecord>,
    pub expenses: Vec<RawRecord>,
}

impl SourceSnapshot {
    /// Collections in the order they are normalized.
    pub fn collections(&self) -> [(EntryKind, &[RawRecord]); 5] {
        [
            (EntryKind::Charge, self.charges.as_slice()),
            (EntryKind::Debt, self.debts.as_slice()),
            (EntryKind::Payment, self.payments.as_slice()),
            (EntryKind::Withdrawal, self.withdrawals.as_slice()),
            (EntryKind::Expense, self.expenses.as_slice()),
        ]
    }

    pub fn len(&self) -> usize {
        self.collections().iter().map(|(_, records)| records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Converts raw records into [`LedgerEntry`]s.
///
/// Dates without an offset (`2024-01-05`, `2024-01-05 14:30`) are read in
/// the business time zone.
#[derive(Clone, Copy, Debug)]
pub struct Normalizer {
    timezone: Tz,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self { timezone: Tz::UTC }
    }
}

impl Normalizer {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Normalizes one record of a known kind.
    ///
    /// Returns the entry plus any coercions made on the way (negative or
    /// unreadable amount, unknown method). An unreadable date is not reported
    /// here: the entry keeps `effective_date = None` and whichever
    /// computation excludes it reports it.
    pub fn normalize(
        &self,
        kind: EntryKind,
        record: &RawRecord,
        arrival: usize,
    ) -> ResultLedger<(LedgerEntry, Vec<Diagnostic>)> {
        let id = record
            .text(ID_FIELDS)
            .ok_or_else(|| LedgerError::MissingId(kind.to_string()))?;
        let mut diagnostics = Vec::new();

        let amount = self.amount(kind, &id, record, &mut diagnostics)?;

        let date_value = record.first(date_fields(kind));
        let effective_date = date_value.and_then(|value| self.parse_date(value));
        let raw_date = date_value.map(value_text);

        let method = record.text(METHOD_FIELDS).and_then(|raw| {
            let method = PaymentMethod::parse(&raw);
            if method.is_none() {
                diagnostics.push(Diagnostic::UnknownMethod {
                    id: id.clone(),
                    kind,
                    raw,
                });
            }
            method
        });

        let entry = LedgerEntry {
            id,
            kind,
            subject_id: record.text(subject_fields(kind)),
            effective_date,
            raw_date,
            amount,
            method,
            description: record.text(DESCRIPTION_FIELDS),
            category: record.text(CATEGORY_FIELDS),
            arrival,
        };
        Ok((entry, diagnostics))
    }

    /// Normalizes a record whose kind is given as text.
    pub fn normalize_tagged(
        &self,
        kind: &str,
        record: &RawRecord,
        arrival: usize,
    ) -> ResultLedger<(LedgerEntry, Vec<Diagnostic>)> {
        let kind = EntryKind::try_from(kind)?;
        self.normalize(kind, record, arrival)
    }

    /// Normalizes a mixed feed in arrival order.
    pub fn normalize_feed(&self, feed: &[TaggedRecord]) -> ResultLedger<Reported<Vec<LedgerEntry>>> {
        let mut entries = Vec::with_capacity(feed.len());
        let mut diagnostics = Vec::new();
        for (arrival, tagged) in feed.iter().enumerate() {
            let (entry, mut issues) = self.normalize_tagged(&tagged.kind, &tagged.record, arrival)?;
            entries.push(entry);
            diagnostics.append(&mut issues);
        }
        Ok(Reported::new(entries, diagnostics))
    }

    /// Normalizes every collection of a snapshot, charges first and expenses
    /// last, numbering arrivals across the whole snapshot.
    pub fn normalize_snapshot(
        &self,
        snapshot: &SourceSnapshot,
    ) -> ResultLedger<Reported<Vec<LedgerEntry>>> {
        let mut entries = Vec::with_capacity(snapshot.len());
        let mut diagnostics = Vec::new();
        for (kind, records) in snapshot.collections() {
            for record in records {
                let arrival = entries.len();
                let (entry, mut issues) = self.normalize(kind, record, arrival)?;
                entries.push(entry);
                diagnostics.append(&mut issues);
            }
        }
        tracing::debug!(
            entries = entries.len(),
            diagnostics = diagnostics.len(),
            "normalized snapshot"
        );
        Ok(Reported::new(entries, diagnostics))
    }

    fn amount(
        &self,
        kind: EntryKind,
        id: &str,
        record: &RawRecord,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ResultLedger<MoneyCents> {
        if !record.has_any(AMOUNT_FIELDS) {
            return Err(LedgerError::MissingAmount {
                kind: kind.to_string(),
                id: id.to_string(),
            });
        }

        let unreadable = |raw: String| Diagnostic::UnreadableAmount {
            id: id.to_string(),
            kind,
            raw,
        };

        let Some(value) = record.first(AMOUNT_FIELDS) else {
            let raw = AMOUNT_FIELDS
                .iter()
                .find_map(|name| record.get(name))
                .map(value_text)
                .unwrap_or_default();
            diagnostics.push(unreadable(raw));
            return Ok(MoneyCents::ZERO);
        };

        let parsed = match value {
            Value::Number(number) => number.as_f64().and_then(MoneyCents::from_major),
            Value::String(text) => text
                .parse::<MoneyCents>()
                .ok()
                .or_else(|| text.trim().parse::<f64>().ok().and_then(MoneyCents::from_major)),
            _ => None,
        };

        match parsed {
            None => {
                diagnostics.push(unreadable(value_text(value)));
                Ok(MoneyCents::ZERO)
            }
            Some(amount) if amount.is_negative() => {
                diagnostics.push(Diagnostic::NegativeAmount {
                    id: id.to_string(),
                    kind,
                    amount,
                });
                Ok(MoneyCents::ZERO)
            }
            Some(amount) if amount > MoneyCents::MAX_AMOUNT => {
                diagnostics.push(unreadable(value_text(value)));
                Ok(MoneyCents::ZERO)
            }
            Some(amount) => Ok(amount),
        }
    }

    /// Parses any of the stored date shapes to an absolute instant.
    pub fn parse_date(&self, value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::String(text) => self.parse_date_text(text.trim()),
            Value::Number(_) => {
                whole_number(value).and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            }
            Value::Object(fields) => {
                let seconds = fields
                    .get("seconds")
                    .or_else(|| fields.get("_seconds"))
                    .and_then(whole_number)?;
                let nanos = fields
                    .get("nanoseconds")
                    .or_else(|| fields.get("_nanoseconds"))
                    .and_then(whole_number)
                    .unwrap_or(0);
                DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?)
            }
            _ => None,
        }
    }

    fn parse_date_text(&self, text: &str) -> Option<DateTime<Utc>> {
        if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
            return Some(instant.with_timezone(&Utc));
        }
        if let Some(naive) = NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        {
            return localize(self.timezone, naive);
        }
        NAIVE_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
            .and_then(|date| local_midnight(self.timezone, date))
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

/// An integer, or a float with no fractional part (`1704067200000.0`).
fn whole_number(value: &Value) -> Option<i64> {
    let number = value.as_number()?;
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f))
            .map(|f| f as i64)
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn payment_prefers_payment_date_over_date() {
        let normalizer = Normalizer::default();
        let raw = record(json!({
            "id": "p1",
            "driverId": "d1",
            "paymentDate": "2024-01-05",
            "date": "2024-02-01",
            "amount": 500,
            "method": "Cash"
        }));
        let (entry, diags) = normalizer.normalize(EntryKind::Payment, &raw, 0).unwrap();
        assert!(diags.is_empty());
        assert_eq!(entry.effective_date, Some(utc(2024, 1, 5, 0, 0)));
        assert_eq!(entry.subject_id.as_deref(), Some("d1"));
        assert_eq!(entry.method, Some(PaymentMethod::Cash));
        assert_eq!(entry.signed_delta(), MoneyCents::new(50_000));
    }

    #[test]
    fn blank_payment_date_falls_back_to_date() {
        let normalizer = Normalizer::default();
        let raw = record(json!({
            "id": "p1",
            "paymentDate": "  ",
            "date": "2024-02-01T10:30:00Z",
            "amount": "12,50"
        }));
        let (entry, _) = normalizer.normalize(EntryKind::Payment, &raw, 0).unwrap();
        assert_eq!(entry.effective_date, Some(utc(2024, 2, 1, 10, 30)));
        assert_eq!(entry.amount, MoneyCents::new(1250));
    }

    #[test]
    fn charge_ignores_payment_date_alias() {
        let normalizer = Normalizer::default();
        let raw = record(json!({"id": "c1", "paymentDate": "2024-01-05", "amount": 150}));
        let (entry, _) = normalizer.normalize(EntryKind::Charge, &raw, 0).unwrap();
        assert_eq!(entry.effective_date, None);
        assert_eq!(entry.raw_date, None);
        assert_eq!(entry.signed_delta(), MoneyCents::new(-15_000));
    }

    #[test]
    fn naive_dates_are_read_in_business_timezone() {
        let normalizer = Normalizer::new(chrono_tz::America::Argentina::Buenos_Aires);
        let raw = record(json!({"id": "c1", "date": "2024-03-01", "amount": 1}));
        let (entry, _) = normalizer.normalize(EntryKind::Charge, &raw, 0).unwrap();
        // UTC-3, no DST.
        assert_eq!(entry.effective_date, Some(utc(2024, 3, 1, 3, 0)));
    }

    #[test]
    fn epoch_millis_and_timestamp_objects_are_dates() {
        let normalizer = Normalizer::default();
        let millis = json!(1_704_067_200_000_i64);
        assert_eq!(normalizer.parse_date(&millis), Some(utc(2024, 1, 1, 0, 0)));
        let object = json!({"seconds": 1_704_067_200_i64, "nanoseconds": 0});
        assert_eq!(normalizer.parse_date(&object), Some(utc(2024, 1, 1, 0, 0)));
        let slashed = json!("05/01/2024");
        assert_eq!(normalizer.parse_date(&slashed), Some(utc(2024, 1, 5, 0, 0)));
        assert_eq!(normalizer.parse_date(&json!("yesterday")), None);
    }

    #[test]
    fn whole_float_timestamps_are_dates() {
        let normalizer = Normalizer::default();
        let jan_1 = Some(utc(2024, 1, 1, 0, 0));
        assert_eq!(normalizer.parse_date(&json!(1_704_067_200_000.0)), jan_1);
        let object = json!({"seconds": 1_704_067_200.0, "nanoseconds": 0.0});
        assert_eq!(normalizer.parse_date(&object), jan_1);
        let fractional = json!({"seconds": 1_704_067_200.5});
        assert_eq!(normalizer.parse_date(&fractional), None);
        assert_eq!(normalizer.parse_date(&json!(1e30)), None);
    }

    #[test]
    fn unreadable_date_keeps_amount_and_raw_text() {
        let normalizer = Normalizer::default();
        let raw = record(json!({"id": "d1", "date": "31/31/2024", "amount": 50}));
        let (entry, diags) = normalizer.normalize(EntryKind::Debt, &raw, 3).unwrap();
        assert!(diags.is_empty());
        assert_eq!(entry.effective_date, None);
        assert_eq!(entry.raw_date.as_deref(), Some("31/31/2024"));
        assert_eq!(entry.amount, MoneyCents::new(5000));
        assert_eq!(entry.arrival, 3);
    }

    #[test]
    fn negative_amount_is_zeroed_and_reported() {
        let normalizer = Normalizer::default();
        let raw = record(json!({"id": "e1", "date": "2024-01-01", "amount": -20}));
        let (entry, diags) = normalizer.normalize(EntryKind::Expense, &raw, 0).unwrap();
        assert_eq!(entry.amount, MoneyCents::ZERO);
        assert_eq!(
            diags,
            vec![Diagnostic::NegativeAmount {
                id: "e1".to_string(),
                kind: EntryKind::Expense,
                amount: MoneyCents::new(-2000),
            }]
        );
    }

    #[test]
    fn null_or_text_amount_is_zeroed_and_reported() {
        let normalizer = Normalizer::default();
        let raw = record(json!({"id": "e1", "date": "2024-01-01", "amount": null}));
        let (entry, diags) = normalizer.normalize(EntryKind::Expense, &raw, 0).unwrap();
        assert_eq!(entry.amount, MoneyCents::ZERO);
        assert!(matches!(diags[0], Diagnostic::UnreadableAmount { .. }));

        let raw = record(json!({"id": "e2", "date": "2024-01-01", "amount": "n/a"}));
        let (_, diags) = normalizer.normalize(EntryKind::Expense, &raw, 0).unwrap();
        assert_eq!(
            diags,
            vec![Diagnostic::UnreadableAmount {
                id: "e2".to_string(),
                kind: EntryKind::Expense,
                raw: "n/a".to_string(),
            }]
        );
    }

    #[test]
    fn implausibly_large_amount_is_zeroed_and_reported() {
        let normalizer = Normalizer::default();
        let raw = record(json!({"id": "p1", "date": "2024-01-01", "amount": "92233720368547758"}));
        let (entry, diags) = normalizer.normalize(EntryKind::Payment, &raw, 0).unwrap();
        assert_eq!(entry.amount, MoneyCents::ZERO);
        assert_eq!(
            diags,
            vec![Diagnostic::UnreadableAmount {
                id: "p1".to_string(),
                kind: EntryKind::Payment,
                raw: "92233720368547758".to_string(),
            }]
        );

        let raw = record(json!({"id": "p2", "date": "2024-01-01", "amount": 9.3e16}));
        let (entry, diags) = normalizer.normalize(EntryKind::Payment, &raw, 0).unwrap();
        assert_eq!(entry.amount, MoneyCents::ZERO);
        assert_eq!(diags.len(), 1);

        let raw = record(json!({"id": "p3", "date": "2024-01-01", "amount": 10_000_000_000_000_i64}));
        let (entry, diags) = normalizer.normalize(EntryKind::Payment, &raw, 0).unwrap();
        assert_eq!(entry.amount, MoneyCents::MAX_AMOUNT);
        assert!(diags.is_empty());
    }

    #[test]
    fn missing_amount_field_is_an_error() {
        let normalizer = Normalizer::default();
        let raw = record(json!({"id": "w1", "date": "2024-01-01"}));
        let err = normalizer
            .normalize(EntryKind::Withdrawal, &raw, 0)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::MissingAmount {
                kind: "withdrawal".to_string(),
                id: "w1".to_string()
            }
        );
    }

    #[test]
    fn unknown_kind_tag_is_an_error() {
        let normalizer = Normalizer::default();
        let raw = record(json!({"id": "x", "amount": 1}));
        assert_eq!(
            normalizer.normalize_tagged("refund", &raw, 0).unwrap_err(),
            LedgerError::UnknownEntryKind("refund".to_string())
        );
    }

    #[test]
    fn unknown_method_is_dropped_and_reported() {
        let normalizer = Normalizer::default();
        let raw = record(json!({"id": "p1", "date": "2024-01-01", "amount": 1, "method": "barter"}));
        let (entry, diags) = normalizer.normalize(EntryKind::Payment, &raw, 0).unwrap();
        assert_eq!(entry.method, None);
        assert!(matches!(&diags[0], Diagnostic::UnknownMethod { raw, .. } if raw == "barter"));
    }

    #[test]
    fn subject_alias_depends_on_kind() {
        let normalizer = Normalizer::default();
        let raw = record(json!({
            "id": "x", "date": "2024-01-01", "amount": 1,
            "ownerId": "owner", "vehicleId": "truck-7", "driverId": "d1"
        }));
        let subject = |kind| {
            normalizer
                .normalize(kind, &raw, 0)
                .unwrap()
                .0
                .subject_id
                .unwrap()
        };
        assert_eq!(subject(EntryKind::Charge), "d1");
        assert_eq!(subject(EntryKind::Withdrawal), "owner");
        assert_eq!(subject(EntryKind::Expense), "truck-7");
    }

    #[test]
    fn snapshot_numbers_arrivals_across_collections() {
        let snapshot: SourceSnapshot = serde_json::from_value(json!({
            "charges": [{"id": "c1", "date": "2024-01-01", "amount": 1}],
            "payments": [
                {"id": "p1", "paymentDate": "2024-01-02", "amount": 2},
                {"id": "p2", "paymentDate": "2024-01-03", "amount": -3}
            ],
            "expenses": [{"id": "e1", "date": "2024-01-04", "amount": 4}]
        }))
        .unwrap();
        let reported = Normalizer::default().normalize_snapshot(&snapshot).unwrap();
        let ids: Vec<(&str, usize)> = reported
            .value
            .iter()
            .map(|e| (e.id.as_str(), e.arrival))
            .collect();
        assert_eq!(ids, vec![("c1", 0), ("p1", 1), ("p2", 2), ("e1", 3)]);
        assert_eq!(reported.diagnostics.len(), 1);
    }
}
