use enumset::{EnumSet, enum_set};

/// Day of the week, indexed from Sunday as in the tariff documents.
#[derive(Debug, enumset::EnumSetType)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

pub const WORKDAYS: EnumSet<Weekday> = enum_set!(
    Weekday::Monday | Weekday::Tuesday | Weekday::Wednesday | Weekday::Thursday | Weekday::Friday
);

pub const WEEKEND: EnumSet<Weekday> = enum_set!(Weekday::Saturday | Weekday::Sunday);

impl Weekday {
    pub const fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::Sunday),
            1 => Some(Self::Monday),
            2 => Some(Self::Tuesday),
            3 => Some(Self::Wednesday),
            4 => Some(Self::Thursday),
            5 => Some(Self::Friday),
            6 => Some(Self::Saturday),
            _ => None,
        }
    }

    /// Resolve a single token: an index, an English or Finnish day name, or an aggregate alias.
    #[must_use]
    pub fn parse_token(token: &str) -> Option<EnumSet<Self>> {
        let token = token.trim().to_lowercase();
        if let Ok(index) = token.parse::<i64>() {
            return Self::from_index(index).map(EnumSet::only);
        }
        let day = match token.as_str() {
            "weekday" | "weekdays" | "arki" | "arkipäivä" | "arkipäivät" => return Some(WORKDAYS),
            "weekend" | "weekends" | "viikonloppu" => return Some(WEEKEND),
            "sun" | "sunday" | "su" | "sunnuntai" => Self::Sunday,
            "mon" | "monday" | "ma" | "maanantai" => Self::Monday,
            "tue" | "tuesday" | "ti" | "tiistai" => Self::Tuesday,
            "wed" | "wednesday" | "ke" | "keskiviikko" => Self::Wednesday,
            "thu" | "thursday" | "to" | "torstai" => Self::Thursday,
            "fri" | "friday" | "pe" | "perjantai" => Self::Friday,
            "sat" | "saturday" | "la" | "lauantai" => Self::Saturday,
            _ => return None,
        };
        Some(EnumSet::only(day))
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Sun => Self::Sunday,
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices() {
        assert_eq!(Weekday::parse_token("0"), Some(EnumSet::only(Weekday::Sunday)));
        assert_eq!(Weekday::parse_token(" 6 "), Some(EnumSet::only(Weekday::Saturday)));
        assert_eq!(Weekday::parse_token("7"), None);
        assert_eq!(Weekday::parse_token("-1"), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(Weekday::parse_token("Mon"), Some(EnumSet::only(Weekday::Monday)));
        assert_eq!(Weekday::parse_token("THURSDAY"), Some(EnumSet::only(Weekday::Thursday)));
        assert_eq!(Weekday::parse_token("pe"), Some(EnumSet::only(Weekday::Friday)));
        assert_eq!(Weekday::parse_token("lauantai"), Some(EnumSet::only(Weekday::Saturday)));
        assert_eq!(Weekday::parse_token("caturday"), None);
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(Weekday::parse_token("weekdays"), Some(WORKDAYS));
        assert_eq!(Weekday::parse_token("Weekend"), Some(WEEKEND));
        assert_eq!(WORKDAYS.len(), 5);
        assert_eq!(WORKDAYS | WEEKEND, EnumSet::all());
    }

    #[test]
    fn test_from_chrono() {
        assert_eq!(Weekday::from(chrono::Weekday::Sun), Weekday::Sunday);
        assert_eq!(Weekday::from(chrono::Weekday::Wed), Weekday::Wednesday);
    }
}
