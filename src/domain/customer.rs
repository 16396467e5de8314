//! Customers and their persons in charge (PICs).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::error::SalesTrackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sector {
    DataCenter,
    OilAndGas,
    Commercial,
    Industrial,
    Mining,
}

impl Sector {
    pub const ALL: [Sector; 5] = [
        Sector::DataCenter,
        Sector::OilAndGas,
        Sector::Commercial,
        Sector::Industrial,
        Sector::Mining,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::DataCenter => "Data Center",
            Sector::OilAndGas => "Oil and Gas",
            Sector::Commercial => "Commercial",
            Sector::Industrial => "Industrial",
            Sector::Mining => "Mining",
        }
    }

    /// Exact match against a stored spelling.
    pub fn from_stored(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sector| sector.as_str() == raw)
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sector {
    type Err = SalesTrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sector| sector.as_str() == s.trim())
            .ok_or_else(|| SalesTrackError::invalid_record("sector", format!("unknown value {s:?}")))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomerPic {
    pub id: String,
    pub customer_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
}

impl CustomerPic {
    /// Name, falling back to email; `None` when both are blank.
    pub fn short_label(&self) -> Option<&str> {
        non_blank(self.name.as_deref()).or_else(|| non_blank(self.email.as_deref()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub sector: Option<Sector>,
    pub created_at: Option<DateTime<Utc>>,
    pub pics: Vec<CustomerPic>,
}

impl Customer {
    /// Comma-separated PIC names (or emails), skipping PICs with neither.
    pub fn pics_summary(&self) -> String {
        self.pics
            .iter()
            .filter_map(CustomerPic::short_label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Attaches each PIC to its customer, keeping the PICs' input order.
/// PICs whose customer is not in `customers` are dropped.
pub fn attach_pics(customers: &mut [Customer], pics: Vec<CustomerPic>) {
    for pic in pics {
        if let Some(customer) = customers.iter_mut().find(|c| c.id == pic.customer_id) {
            customer.pics.push(pic);
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

fn trimmed(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// A PIC as entered on a customer form. Fields are trimmed and blank ones
/// are `None`. A PIC with an `id` updates an existing row; one without is
/// inserted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PicDraft {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
}

impl PicDraft {
    pub fn new(name: &str, email: &str, phone: &str, position: &str) -> Self {
        Self {
            id: None,
            name: trimmed(name),
            email: trimmed(email),
            phone: trimmed(phone),
            position: trimmed(position),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = trimmed(id);
        self
    }

    /// All four contact fields blank; such PICs are skipped on save.
    pub fn is_blank(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.position.is_none()
    }

    pub fn into_pic(self, id: String, customer_id: &str) -> CustomerPic {
        CustomerPic {
            id,
            customer_id: customer_id.to_string(),
            name: self.name,
            email: self.email,
            phone: self.phone,
            position: self.position,
        }
    }
}

/// `name|email|phone|position`, optionally prefixed with `id=` to address an
/// existing PIC. Missing trailing fields are blank.
impl FromStr for PicDraft {
    type Err = SalesTrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, rest) = match s.split_once('=') {
            Some((id, rest)) if !id.contains('|') => (Some(id), rest),
            _ => (None, s),
        };
        let fields: Vec<&str> = rest.split('|').collect();
        if fields.len() > 4 {
            return Err(SalesTrackError::invalid_record(
                "pic",
                format!("expected name|email|phone|position, got {s:?}"),
            ));
        }
        let field = |i: usize| fields.get(i).copied().unwrap_or("");
        let draft = PicDraft::new(field(0), field(1), field(2), field(3));
        Ok(match id {
            Some(id) => draft.with_id(id),
            None => draft,
        })
    }
}

/// Customer form payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerDraft {
    pub name: String,
    pub sector: Option<Sector>,
    pub pics: Vec<PicDraft>,
}

impl CustomerDraft {
    /// Trims the name and rejects a blank one. All-blank new PICs are
    /// dropped; an all-blank PIC with an id keeps that PIC as it is.
    pub fn new(
        name: &str,
        sector: Option<Sector>,
        pics: Vec<PicDraft>,
    ) -> Result<Self, SalesTrackError> {
        let name = trimmed(name)
            .ok_or_else(|| SalesTrackError::invalid_record("customer", "name is required"))?;
        Ok(Self {
            name,
            sector,
            pics: pics
                .into_iter()
                .filter(|p| p.id.is_some() || !p.is_blank())
                .collect(),
        })
    }
}
