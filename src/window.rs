/// Validity interval of the active credential, in epoch millis. An absent
/// bound is unbounded on that side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionWindow {
    pub issued_at_millis: Option<i64>,
    pub expires_at_millis: Option<i64>,
}

impl SessionWindow {
    pub fn new(issued_at_millis: Option<i64>, expires_at_millis: Option<i64>) -> Self {
        Self {
            issued_at_millis,
            expires_at_millis,
        }
    }

    pub fn contains(&self, at_millis: i64) -> bool {
        if let Some(issued) = self.issued_at_millis {
            if at_millis < issued {
                return false;
            }
        }
        if let Some(expires) = self.expires_at_millis {
            if at_millis > expires {
                return false;
            }
        }
        true
    }
}
