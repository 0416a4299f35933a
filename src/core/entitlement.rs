//! Entitlement resolution.
//!
//! Raw order records come from the order/contract subsystem with loosely
//! typed option bags on each line item. They are mapped onto
//! [`OrderLineItem`] at this boundary; anything that does not map cleanly is
//! treated as ineligible rather than reported as an error, since "no eligible
//! orders" is a normal business state.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::collaborators::ExpiryRuleLookup;
use crate::core::model::{
    ClassGroup, Entitlement, OrderStatus, ScheduleCondition, ScheduleEvent, ScheduleType,
};
use crate::util::ids::{OrderId, StudentId};

/// Minutes in one purchased session.
pub const DEFAULT_SESSION_MINUTES: u32 = 50;

/// Order as returned by the order/contract subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Order id.
    pub id: OrderId,
    /// Purchasing student.
    pub member_id: StudentId,
    /// Raw status text.
    pub status: String,
    /// Purchase time.
    pub created_at: DateTime<Utc>,
    /// Hard expiry set on the order itself.
    pub expired_at: Option<DateTime<Utc>>,
    /// Order-level option bag.
    #[serde(default)]
    pub options: serde_json::Value,
    /// Line items.
    #[serde(default)]
    pub products: Vec<OrderProductRecord>,
}

/// Line item as returned by the order/contract subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProductRecord {
    /// Product id.
    pub id: String,
    /// Product display name.
    #[serde(default)]
    pub name: String,
    /// Contract end date of the line item.
    pub ended_at: Option<DateTime<Utc>>,
    /// Line-item option bag.
    #[serde(default)]
    pub options: serde_json::Value,
}

/// What a line item sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineItemKind {
    /// Teaching sessions of a given partition.
    Session(ScheduleType),
    /// Books and other materials; never backs an entitlement.
    Materials,
}

/// Validated view of a line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineItem {
    /// Product id.
    pub product_id: String,
    /// Kind of product.
    pub kind: LineItemKind,
    /// Teaching language.
    pub language: Option<String>,
    /// Purchased session count.
    pub total_sessions: u32,
    /// Campus of the line item.
    pub campus: Option<String>,
    /// Contract end date.
    pub ends_at: Option<DateTime<Utc>>,
    /// False only when the line item is explicitly flagged unpaid.
    pub paid: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLineItemOptions {
    class_type: Option<String>,
    language: Option<String>,
    total_sessions: Option<RawCount>,
    campus: Option<String>,
    paid: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCount {
    Number(u32),
    Text(String),
}

impl RawCount {
    fn value(&self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOrderOptions {
    campus: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_options<T>(value: &serde_json::Value) -> Option<T>
where
    T: Default + for<'de> Deserialize<'de>,
{
    if value.is_null() {
        return Some(T::default());
    }
    serde_json::from_value(value.clone()).ok()
}

impl OrderLineItem {
    /// Map a raw line item, or `None` when it is malformed.
    pub fn from_record(record: &OrderProductRecord) -> Option<Self> {
        let raw: RawLineItemOptions = parse_options(&record.options)?;
        let class_type = non_blank(raw.class_type)?;
        let kind = if class_type == "materials" {
            LineItemKind::Materials
        } else {
            LineItemKind::Session(class_type.parse().ok()?)
        };
        let total_sessions = match (kind, raw.total_sessions.as_ref()) {
            (LineItemKind::Materials, count) => count.and_then(RawCount::value).unwrap_or(0),
            (LineItemKind::Session(_), count) => count?.value()?,
        };
        Some(Self {
            product_id: record.id.clone(),
            kind,
            language: non_blank(raw.language),
            total_sessions,
            campus: non_blank(raw.campus),
            ends_at: record.ended_at,
            paid: raw.paid.unwrap_or(true),
        })
    }

    fn backs(&self, class: &ClassGroup) -> bool {
        if self.kind != LineItemKind::Session(class.schedule_type) {
            return false;
        }
        match &class.language {
            Some(language) => self.language.as_deref() == Some(language.as_str()),
            None => true,
        }
    }
}

/// Why an order was left out. Only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    /// Order-level options could not be read.
    MalformedOrder,
    /// No session line item matches the class type and language.
    NoMatchingLineItem,
    /// Status text contains `EXPIRED`.
    StatusExpired,
    /// Hard expiry on the order has passed.
    HardExpiryPassed,
    /// Rule-derived (or line-item) expiry has passed.
    ExpiryPassed,
    /// Order campus differs from the class campus.
    CampusConflict,
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::MalformedOrder => "malformed order options",
            Self::NoMatchingLineItem => "no matching line item",
            Self::StatusExpired => "status expired",
            Self::HardExpiryPassed => "hard expiry passed",
            Self::ExpiryPassed => "entitlement expiry passed",
            Self::CampusConflict => "campus conflict",
        };
        f.write_str(reason)
    }
}

/// Filters orders down to the entitlements usable by one class.
pub struct EntitlementResolver<'a> {
    rules: &'a dyn ExpiryRuleLookup,
    session_minutes: u32,
}

impl<'a> EntitlementResolver<'a> {
    /// Resolver using `rules` for expiry and `session_minutes` per session.
    pub fn new(rules: &'a dyn ExpiryRuleLookup, session_minutes: u32) -> Self {
        Self {
            rules,
            session_minutes,
        }
    }

    /// Resolve every eligible entitlement among `orders` for `class`.
    ///
    /// `available_minutes` starts equal to `total_minutes`; booked usage is
    /// applied separately by [`apply_used_minutes`].
    pub fn resolve(
        &self,
        orders: &[OrderRecord],
        class: &ClassGroup,
        condition: &ScheduleCondition,
        now: DateTime<Utc>,
    ) -> Vec<Entitlement> {
        let resolved: Vec<Entitlement> = orders
            .iter()
            .filter_map(|order| match self.resolve_one(order, class, condition, now) {
                Ok(entitlement) => Some(entitlement),
                Err(reason) => {
                    tracing::debug!(order = %order.id, class = %class.id, %reason, "order ineligible");
                    None
                }
            })
            .collect();
        tracing::debug!(
            class = %class.id,
            orders = orders.len(),
            eligible = resolved.len(),
            "resolved entitlements"
        );
        resolved
    }

    /// Resolve a single order, reporting why it was rejected.
    pub fn resolve_one(
        &self,
        order: &OrderRecord,
        class: &ClassGroup,
        condition: &ScheduleCondition,
        now: DateTime<Utc>,
    ) -> Result<Entitlement, Ineligibility> {
        let order_options: RawOrderOptions =
            parse_options(&order.options).ok_or(Ineligibility::MalformedOrder)?;

        let item = order
            .products
            .iter()
            .filter_map(OrderLineItem::from_record)
            .find(|item| item.backs(class))
            .ok_or(Ineligibility::NoMatchingLineItem)?;

        let status = OrderStatus::from_raw(&order.status);
        if status == OrderStatus::Expired {
            return Err(Ineligibility::StatusExpired);
        }
        if order.expired_at.is_some_and(|at| at < now) {
            return Err(Ineligibility::HardExpiryPassed);
        }

        let expires_at = self
            .rules
            .calculate_expiry_date(
                item.language.as_deref(),
                item.total_sessions,
                condition.start_date,
            )
            .or(item.ends_at);
        if expires_at.is_some_and(|at| at < now) {
            return Err(Ineligibility::ExpiryPassed);
        }

        let campus = non_blank(order_options.campus).or_else(|| item.campus.clone());
        if let (Some(wanted), Some(actual)) = (&class.campus_id, &campus) {
            if wanted != actual {
                return Err(Ineligibility::CampusConflict);
            }
        }

        let total_minutes = item.total_sessions.saturating_mul(self.session_minutes);
        Ok(Entitlement {
            id: order.id.clone(),
            student_id: order.member_id.clone(),
            language: item.language,
            total_minutes,
            used_minutes: 0,
            available_minutes: total_minutes,
            session_count: item.total_sessions,
            created_at: order.created_at,
            expires_at,
            status,
            campus,
            line_item_paid: item.paid,
        })
    }
}

/// Resolve with the default session length.
pub fn resolve_eligible_entitlements(
    orders: &[OrderRecord],
    class: &ClassGroup,
    condition: &ScheduleCondition,
    rules: &dyn ExpiryRuleLookup,
    now: DateTime<Utc>,
) -> Vec<Entitlement> {
    EntitlementResolver::new(rules, DEFAULT_SESSION_MINUTES).resolve(orders, class, condition, now)
}

/// Subtract minutes already booked against each entitlement.
///
/// `booked` holds scheduled events across all classes, oldest first. Each
/// event charges its duration once per attending student, drawn from that
/// student's orders listed on the event in earliest-expiry order; entitlements
/// without an expiry are drawn last. Minutes beyond what those orders hold
/// land on the last one, so its available minutes clamp at zero.
pub fn apply_used_minutes(entitlements: &mut [Entitlement], booked: &[ScheduleEvent]) {
    let mut draw_order: Vec<usize> = (0..entitlements.len()).collect();
    draw_order.sort_by_key(|&i| {
        let e = &entitlements[i];
        (e.expires_at.is_none(), e.expires_at, e.created_at, e.id.clone())
    });

    let mut used = vec![0u32; entitlements.len()];
    for event in booked {
        let minutes = event.duration_minutes();
        let students: BTreeSet<&StudentId> = event.student_ids.iter().collect();
        for student in students {
            let backing: Vec<usize> = draw_order
                .iter()
                .copied()
                .filter(|&i| entitlements[i].student_id == *student && event.order_ids.contains(&entitlements[i].id))
                .collect();
            let Some(&last) = backing.last() else {
                continue;
            };
            let mut remaining = minutes;
            for &i in &backing {
                let take = remaining.min(entitlements[i].total_minutes.saturating_sub(used[i]));
                used[i] += take;
                remaining -= take;
                if remaining == 0 {
                    break;
                }
            }
            used[last] = used[last].saturating_add(remaining);
        }
    }

    for (entitlement, minutes) in entitlements.iter_mut().zip(used) {
        entitlement.set_used_minutes(minutes);
    }
}
