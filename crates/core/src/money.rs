/// Monetary amount as the invest API wires it: whole units plus nano part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoneyValue {
    pub units: i64,
    /// Fractional part in [-999_999_999, 999_999_999], same sign as `units`.
    pub nano: i32,
}

impl MoneyValue {
    pub fn to_f64(self) -> f64 {
        self.units as f64 + self.nano as f64 * 1e-9
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Up,
    Down,
    Flat,
}

impl Change {
    pub fn classify(value: f64) -> Self {
        if value < 0.0 {
            Change::Down
        } else if value > 0.0 {
            Change::Up
        } else {
            Change::Flat
        }
    }
}

/// Localized gain/loss annotation used in the report body.
pub fn annotate(value: f64) -> String {
    match Change::classify(value) {
        Change::Down => format!("падение на <font color=FF0000>{:.2}₽</font>", value.abs()),
        Change::Up => format!("рост на <font color=008000>{value:.2}₽</font>"),
        Change::Flat => "изменений нет".to_string(),
    }
}
