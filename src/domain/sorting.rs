use crate::domain::item::Item;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::str::FromStr;

/// Fields available for ordering the cards of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Name,
    DaysOpen,
}

/// Sort order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "id" => Ok(SortField::Id),
            "name" => Ok(SortField::Name),
            "days-open" => Ok(SortField::DaysOpen),
            _ => Err(format!(
                "Invalid sort field '{}'. Valid fields: id, name, days-open",
                s
            )),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => Err(format!(
                "Invalid sort order '{}'. Valid orders: asc, desc",
                s
            )),
        }
    }
}

/// Sorts items in place by the given field and direction.
///
/// Works on owned items or references, so a column view can be reordered
/// without touching the collection it borrows from. The sort is stable.
///
/// # Examples
/// ```
/// use referral_pipeline::domain::item::Item;
/// use referral_pipeline::domain::sorting::{sort_items, SortField, SortOrder};
///
/// let mut items = vec![
///     Item::new("R3", "New Referral"),
///     Item::new("R1", "New Referral"),
///     Item::new("R2", "New Referral"),
/// ];
///
/// sort_items(&mut items, SortField::Id, SortOrder::Ascending);
/// assert_eq!(items[0].id.as_str(), "R1");
/// ```
pub fn sort_items<T: Borrow<Item>>(items: &mut [T], field: SortField, order: SortOrder) {
    items.sort_by(|a, b| {
        let (a, b) = (a.borrow(), b.borrow());
        match field {
            SortField::Id => apply_order(a.id.cmp(&b.id), order),
            SortField::Name => apply_order(compare_names(a.name(), b.name()), order),
            // Items without a day count always go last
            SortField::DaysOpen => match (a.days_open(), b.days_open()) {
                (Some(x), Some(y)) => apply_order(x.cmp(&y), order),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    });
}

fn apply_order(cmp: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Ascending => cmp,
        SortOrder::Descending => cmp.reverse(),
    }
}

/// Case-insensitive name comparison
fn compare_names(a: Option<&str>, b: Option<&str>) -> Ordering {
    let a = a.unwrap_or_default().to_lowercase();
    let b = b.unwrap_or_default().to_lowercase();
    a.cmp(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn referral(id: &str, name: &str, days_open: Option<u64>) -> Item {
        let item = Item::new(id, "New Referral").with_attribute("name", name);
        match days_open {
            Some(days) => item.with_attribute("daysOpen", days),
            None => item,
        }
    }

    #[test]
    fn test_sort_by_id_descending() {
        let mut items = vec![
            referral("R1", "A", None),
            referral("R3", "C", None),
            referral("R2", "B", None),
        ];

        sort_items(&mut items, SortField::Id, SortOrder::Descending);

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["R3", "R2", "R1"]);
    }

    #[test]
    fn test_sort_by_name_case_insensitive() {
        let mut items = vec![
            referral("R1", "charlie", None),
            referral("R2", "Alice", None),
            referral("R3", "bob", None),
        ];

        sort_items(&mut items, SortField::Name, SortOrder::Ascending);

        let names: Vec<&str> = items.iter().filter_map(|i| i.name()).collect();
        assert_eq!(names, vec!["Alice", "bob", "charlie"]);
    }

    #[test]
    fn test_sort_by_days_open_missing_last_in_both_orders() {
        let mut items = vec![
            referral("R1", "A", None),
            referral("R2", "B", Some(3)),
            referral("R3", "C", Some(20)),
        ];

        sort_items(&mut items, SortField::DaysOpen, SortOrder::Descending);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["R3", "R2", "R1"]);

        sort_items(&mut items, SortField::DaysOpen, SortOrder::Ascending);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["R2", "R3", "R1"]);
    }

    #[test]
    fn test_sort_references() {
        let owned = vec![referral("R2", "B", None), referral("R1", "A", None)];
        let mut refs: Vec<&Item> = owned.iter().collect();

        sort_items(&mut refs, SortField::Id, SortOrder::Ascending);

        assert_eq!(refs[0].id.as_str(), "R1");
        assert_eq!(owned[0].id.as_str(), "R2");
    }

    #[test]
    fn test_parse_sort_field_and_order() {
        assert_eq!("days-open".parse::<SortField>(), Ok(SortField::DaysOpen));
        assert_eq!("NAME".parse::<SortField>(), Ok(SortField::Name));
        assert!("owner".parse::<SortField>().is_err());

        assert_eq!("desc".parse::<SortOrder>(), Ok(SortOrder::Descending));
        assert!("up".parse::<SortOrder>().is_err());
    }
}
