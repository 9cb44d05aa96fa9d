use crate::chat::Laptop;

pub const MAX_SELECTION: usize = 3;

/// Laptops picked for side-by-side comparison, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    items: Vec<Laptop>,
    comparison_open: bool,
}

impl SelectionSet {
    pub fn toggle(&mut self, laptop: &Laptop) {
        if let Some(index) = self.items.iter().position(|item| item.id == laptop.id) {
            self.items.remove(index);
            if !self.can_compare() {
                self.comparison_open = false;
            }
        } else if self.items.len() < MAX_SELECTION {
            self.items.push(laptop.clone());
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.comparison_open = false;
    }

    pub fn contains(&self, id: i64) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    pub fn can_compare(&self) -> bool {
        self.items.len() >= 2
    }

    pub fn open_comparison(&mut self) {
        if self.can_compare() {
            self.comparison_open = true;
        }
    }

    pub fn is_comparison_open(&self) -> bool {
        self.comparison_open
    }

    pub fn items(&self) -> &[Laptop] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cheapest laptop; on equal prices the earliest one wins.
pub fn best_value(laptops: &[Laptop]) -> Option<&Laptop> {
    let mut iter = laptops.iter();
    let first = iter.next()?;
    Some(iter.fold(first, |best, laptop| {
        if laptop.price < best.price {
            laptop
        } else {
            best
        }
    }))
}

#[derive(Debug, Clone, Copy)]
pub struct ComparisonRow {
    pub label: &'static str,
    pub value: fn(&Laptop) -> String,
}

pub const COMPARISON_ROWS: [ComparisonRow; 6] = [
    ComparisonRow {
        label: "Processor",
        value: |laptop| laptop.processor.clone(),
    },
    ComparisonRow {
        label: "RAM",
        value: |laptop| laptop.ram.clone(),
    },
    ComparisonRow {
        label: "Storage",
        value: |laptop| laptop.storage.clone(),
    },
    ComparisonRow {
        label: "Display",
        value: |laptop| laptop.display.clone(),
    },
    ComparisonRow {
        label: "Graphics",
        value: |laptop| laptop.graphics.clone(),
    },
    ComparisonRow {
        label: "Price",
        value: |laptop| format_pkr(laptop.price),
    },
];

pub fn format_pkr(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("PKR {sign}{grouped}")
}
