//! Normalizing raw checkout rows into weighted interactions.
//!
//! Every checkout is an equally strong positive signal, so each
//! [`Interaction`] gets the same [`INTERACTION_WEIGHT`]. Interaction flags
//! (printed / real / source / type) are ignored.
//!
//! ## Date layouts
//! Exports mix ISO dates (`2021-01-15`) with day-first dates (`15.01.2021`,
//! `15/01/2021`). ISO is unambiguous and tried first; every other layout is
//! read day-first, never month-first.

use chrono::{NaiveDate, NaiveDateTime};
use data_loader::{DataLoadError, ItemId, RawInteractionRecord, Result, UserId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Weight given to every interaction
pub const INTERACTION_WEIGHT: u32 = 10;

/// Date-time layouts, in the order they are tried
const DATETIME_FORMATS: [&str; 9] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

/// Date-only layouts, in the order they are tried
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y"];

/// A checkout in canonical form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub timestamp: NaiveDateTime,
    pub weight: u32,
}

/// Parse an interaction date, preferring day/month over month/day.
///
/// Returns `None` if no accepted layout matches.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Convert raw checkout rows into [`Interaction`]s.
///
/// A row whose date is missing or unreadable fails the whole call with
/// [`DataLoadError::InvalidDate`]; no partial result is returned.
pub fn normalize(raw_interactions: &[RawInteractionRecord]) -> Result<Vec<Interaction>> {
    let interactions = raw_interactions
        .iter()
        .map(|raw| {
            let value = raw.date.as_deref().unwrap_or_default();
            let timestamp = parse_date(value).ok_or_else(|| DataLoadError::InvalidDate {
                value: value.to_string(),
                line: raw.line,
            })?;
            Ok(Interaction {
                user_id: raw.user_id.clone(),
                item_id: raw.item_id.clone(),
                timestamp,
                weight: INTERACTION_WEIGHT,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Normalized {} interactions", interactions.len());
    Ok(interactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_day_first_layouts() {
        for raw in ["01.02.2020", "01/02/2020", "01-02-2020"] {
            let parsed = parse_date(raw).unwrap();
            assert_eq!((parsed.day(), parsed.month(), parsed.year()), (1, 2, 2020), "{}", raw);
            assert_eq!((parsed.hour(), parsed.minute()), (0, 0), "{}", raw);
        }

        for raw in [
            "15.01.2021 09:30",
            "15.01.2021 09:30:00",
            "15/01/2021 09:30",
            "15/01/2021 09:30:00",
            "15-01-2021 09:30",
            "15-01-2021 09:30:00",
        ] {
            let parsed = parse_date(raw).unwrap_or_else(|| panic!("{} rejected", raw));
            assert_eq!((parsed.day(), parsed.month(), parsed.year()), (15, 1, 2021), "{}", raw);
            assert_eq!((parsed.hour(), parsed.minute()), (9, 30), "{}", raw);
        }
    }

    #[test]
    fn test_iso_dates_and_times() {
        let date = parse_date("2020-02-01").unwrap();
        assert_eq!((date.day(), date.month()), (1, 2));

        let datetime = parse_date("2020-02-01 13:45:10").unwrap();
        assert_eq!((datetime.hour(), datetime.minute()), (13, 45));

        let dotted = parse_date("15.01.2021 09:30").unwrap();
        assert_eq!((dotted.day(), dotted.month(), dotted.hour()), (15, 1, 9));
    }

    #[test]
    fn test_month_first_is_not_accepted() {
        // 13 is not a valid month, so day-first is the only reading
        let parsed = parse_date("13.01.2021").unwrap();
        assert_eq!((parsed.day(), parsed.month()), (13, 1));
        // and month-first dates with a day > 12 do not parse at all
        assert!(parse_date("01/13/2021").is_none());
    }

    #[test]
    fn test_normalize_assigns_constant_weight() {
        let raw = vec![
            RawInteractionRecord::new("u1", "i1", "01.02.2020"),
            RawInteractionRecord::new("u1", "i2", "2020-02-03"),
        ];
        let interactions = normalize(&raw).unwrap();

        assert_eq!(interactions.len(), 2);
        assert!(interactions.iter().all(|i| i.weight == INTERACTION_WEIGHT));
        assert_eq!(interactions[1].item_id, "i2");
    }

    #[test]
    fn test_unparseable_date_is_fatal() {
        let mut bad = RawInteractionRecord::new("u2", "i1", "yesterday");
        bad.line = 7;
        let raw = vec![RawInteractionRecord::new("u1", "i1", "01.02.2020"), bad];

        match normalize(&raw) {
            Err(DataLoadError::InvalidDate { value, line }) => {
                assert_eq!(value, "yesterday");
                assert_eq!(line, 7);
            }
            other => panic!("expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_date_is_fatal() {
        let mut raw = RawInteractionRecord::new("u1", "i1", "");
        raw.date = None;
        assert!(matches!(normalize(&[raw]), Err(DataLoadError::InvalidDate { .. })));
    }
}
