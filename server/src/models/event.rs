use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i32,
    pub name: String,
    pub category: Option<String>,
    pub date: NaiveDate,
    pub time_from: String,
    pub time_until: String,
    pub calendar_id: i32,
    pub user_id: i32,
}

/// Body of a create request: every column except the storage-assigned `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub category: Option<String>,
    pub date: NaiveDate,
    pub time_from: String,
    pub time_until: String,
    pub calendar_id: i32,
    pub user_id: i32,
}

impl NewEvent {
    pub fn with_id(self, id: i32) -> Event {
        Event {
            id,
            name: self.name,
            category: self.category,
            date: self.date,
            time_from: self.time_from,
            time_until: self.time_until,
            calendar_id: self.calendar_id,
            user_id: self.user_id,
        }
    }
}

impl From<Event> for NewEvent {
    fn from(event: Event) -> Self {
        Self {
            name: event.name,
            category: event.category,
            date: event.date,
            time_from: event.time_from,
            time_until: event.time_until,
            calendar_id: event.calendar_id,
            user_id: event.user_id,
        }
    }
}

/// Partial update. Absent fields keep their stored value. `category` is
/// tri-state: absent keeps it, `null` clears it, a string replaces it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    pub time_from: Option<String>,
    pub time_until: Option<String>,
    pub calendar_id: Option<i32>,
    pub user_id: Option<i32>,
}

impl EventPatch {
    pub fn apply(self, current: NewEvent) -> NewEvent {
        NewEvent {
            name: self.name.unwrap_or(current.name),
            category: self.category.unwrap_or(current.category),
            date: self.date.unwrap_or(current.date),
            time_from: self.time_from.unwrap_or(current.time_from),
            time_until: self.time_until.unwrap_or(current.time_until),
            calendar_id: self.calendar_id.unwrap_or(current.calendar_id),
            user_id: self.user_id.unwrap_or(current.user_id),
        }
    }
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Half-open date interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// The calendar month `month` (1 = January) of `year`.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let (next_year, next_month) = if start.month() == 12 {
            (year.checked_add(1)?, 1)
        } else {
            (year, month + 1)
        };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
        Some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub period: Option<Period>,
    pub calendar_id: Option<i32>,
    pub user_id: Option<i32>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        self.period.map_or(true, |p| p.contains(event.date))
            && self.calendar_id.map_or(true, |id| id == event.calendar_id)
            && self.user_id.map_or(true, |id| id == event.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_period_bounds() {
        let period = Period::month(2024, 2).unwrap();
        assert_eq!(period.start, date(2024, 2, 1));
        assert_eq!(period.end, date(2024, 3, 1));
        assert!(period.contains(date(2024, 2, 29)));
        assert!(!period.contains(date(2024, 3, 1)));
        assert!(!period.contains(date(2024, 1, 31)));
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let period = Period::month(2023, 12).unwrap();
        assert_eq!(period.start, date(2023, 12, 1));
        assert_eq!(period.end, date(2024, 1, 1));
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(Period::month(2024, 0).is_none());
        assert!(Period::month(2024, 13).is_none());
        assert!(Period::month(i32::MAX, 12).is_none());
    }

    #[test]
    fn test_patch_keeps_unset_fields() {
        let current = NewEvent {
            name: "Standup".into(),
            category: Some("work".into()),
            date: date(2024, 5, 6),
            time_from: "09:00".into(),
            time_until: "09:15".into(),
            calendar_id: 1,
            user_id: 7,
        };
        let patch = EventPatch {
            name: Some("Retro".into()),
            time_until: Some("10:00".into()),
            ..Default::default()
        };

        let merged = patch.apply(current.clone());
        assert_eq!(merged.name, "Retro");
        assert_eq!(merged.time_until, "10:00");
        assert_eq!(merged.category, current.category);
        assert_eq!(merged.date, current.date);
        assert_eq!(merged.user_id, 7);
    }

    #[test]
    fn test_patch_category_null_clears_absent_keeps() {
        let current = NewEvent {
            name: "Gym".into(),
            category: Some("personal".into()),
            date: date(2024, 5, 7),
            time_from: "07:00".into(),
            time_until: "08:00".into(),
            calendar_id: 1,
            user_id: 7,
        };

        let keep: EventPatch = serde_json::from_str(r#"{"name": "Swim"}"#).unwrap();
        assert_eq!(keep.category, None);
        assert_eq!(keep.apply(current.clone()).category.as_deref(), Some("personal"));

        let clear: EventPatch = serde_json::from_str(r#"{"category": null}"#).unwrap();
        assert_eq!(clear.category, Some(None));
        assert_eq!(clear.apply(current.clone()).category, None);

        let replace: EventPatch = serde_json::from_str(r#"{"category": "work"}"#).unwrap();
        assert_eq!(replace.apply(current).category.as_deref(), Some("work"));
    }

    #[test]
    fn test_filter_matches_all_criteria() {
        let event = NewEvent {
            name: "Dentist".into(),
            category: None,
            date: date(2024, 5, 20),
            time_from: "14:00".into(),
            time_until: "15:00".into(),
            calendar_id: 3,
            user_id: 9,
        }
        .with_id(1);

        assert!(EventFilter::default().matches(&event));
        let filter = EventFilter {
            period: Period::month(2024, 5),
            calendar_id: Some(3),
            user_id: Some(9),
        };
        assert!(filter.matches(&event));
        assert!(!EventFilter {
            user_id: Some(10),
            ..filter
        }
        .matches(&event));
        assert!(!EventFilter {
            period: Period::month(2024, 6),
            ..filter
        }
        .matches(&event));
    }

    #[test]
    fn test_event_json_shape() {
        let json = r#"{
            "name": "Lunch",
            "date": "2024-05-01",
            "time_from": "12:00",
            "time_until": "13:00",
            "calendar_id": 1,
            "user_id": 2
        }"#;
        let new_event: NewEvent = serde_json::from_str(json).unwrap();
        assert_eq!(new_event.category, None);

        let value = serde_json::to_value(new_event.with_id(5)).unwrap();
        assert_eq!(value["id"], 5);
        assert_eq!(value["date"], "2024-05-01");
        assert_eq!(value["category"], serde_json::Value::Null);
    }
}
