use gst_invoice::money::{round_amount, GST_RATE};
use gst_invoice::{Field, Ledger, LineItem, SortOrder, ValidationError};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn price_strategy() -> impl Strategy<Value = Decimal> {
    (0u64..10_000_000, 0u32..=4).prop_map(|(units, scale)| Decimal::new(units as i64, scale))
}

fn item_strategy() -> impl Strategy<Value = (String, Decimal, u32)> {
    ("[A-Za-z][A-Za-z ]{0,6}", price_strategy(), 0u32..1_000)
}

fn names(items: &[LineItem]) -> Vec<String> {
    items.iter().map(|item| item.name().to_owned()).collect()
}

proptest! {
    #[test]
    fn adding_an_item_raises_subtotal_by_line_total(
        existing in prop::collection::vec(item_strategy(), 0..8),
        (name, price, quantity) in item_strategy(),
    ) {
        let mut ledger = Ledger::new();
        for (name, price, quantity) in &existing {
            ledger.add_item(name, &price.to_string(), &quantity.to_string()).unwrap();
        }
        let before = ledger.subtotal();

        ledger.add_item(&name, &price.to_string(), &quantity.to_string()).unwrap();

        prop_assert_eq!(ledger.subtotal() - before, price * Decimal::from(quantity));
    }

    #[test]
    fn total_is_subtotal_plus_gst(items in prop::collection::vec(item_strategy(), 0..12)) {
        let mut ledger = Ledger::new();
        for (name, price, quantity) in &items {
            ledger.add_item(name, &price.to_string(), &quantity.to_string()).unwrap();
        }

        let subtotal = ledger.subtotal();
        prop_assert_eq!(ledger.tax(), subtotal * GST_RATE);
        prop_assert_eq!(
            round_amount(ledger.total()),
            round_amount(subtotal + subtotal * GST_RATE)
        );
    }

    #[test]
    fn listings_are_reversed_permutations(items in prop::collection::vec(item_strategy(), 0..12)) {
        let mut ledger = Ledger::new();
        for (name, price, quantity) in &items {
            ledger.add_item(name, &price.to_string(), &quantity.to_string()).unwrap();
        }

        let ascending = ledger.list_items(SortOrder::Ascending);
        let descending = ledger.list_items(SortOrder::Descending);

        let mut reversed = names(&descending);
        reversed.reverse();
        prop_assert_eq!(names(&ascending), reversed);

        let mut ids: Vec<_> = ascending.iter().map(LineItem::id).collect();
        ids.sort();
        let stored: Vec<_> = ledger.items().iter().map(LineItem::id).collect();
        prop_assert_eq!(ids, stored);

        // Equal names keep insertion order in both directions.
        for listing in [&ascending, &descending] {
            for pair in listing.windows(2) {
                if pair[0].name() == pair[1].name() {
                    prop_assert!(pair[0].id() < pair[1].id());
                }
            }
        }
    }

    #[test]
    fn empty_name_is_reported_first(price in "\\PC{0,6}", quantity in "\\PC{0,6}") {
        let mut ledger = Ledger::new();
        prop_assert_eq!(
            ledger.add_item("", &price, &quantity),
            Err(ValidationError::EmptyField(Field::Name))
        );
        prop_assert!(ledger.is_empty());
    }
}

#[test]
fn non_numeric_text_is_rejected() {
    let mut ledger = Ledger::new();
    assert_eq!(
        ledger.add_item("Widget", "abc", "1"),
        Err(ValidationError::NotANumber(Field::Price))
    );
    assert_eq!(
        ledger.add_item("Widget", "1", "abc"),
        Err(ValidationError::NotANumber(Field::Quantity))
    );
}

#[test]
fn widget_gadget_scenario() {
    let mut ledger = Ledger::new();
    ledger.add_item("Widget", "10.00", "3").unwrap();
    ledger.add_item("Gadget", "5.50", "2").unwrap();

    let totals = ledger.totals();
    assert_eq!(totals.subtotal, Decimal::new(4100, 2));
    assert_eq!(totals.tax, Decimal::new(738, 2));
    assert_eq!(totals.total, Decimal::new(4838, 2));
}
