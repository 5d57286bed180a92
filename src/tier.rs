//! Price tier classification for the district ranking.

use serde::Serialize;

/// One labeled price band. `min_price` is the inclusive lower bound in
/// manwon; the color fields are display metadata passed through to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tier {
    pub name: &'static str,
    pub min_price: i64,
    pub color: &'static str,
    pub bg: &'static str,
    pub border: &'static str,
}

/// Ordered descending by `min_price`; the final band floors at 0 so every
/// non-negative value classifies.
pub const TIERS: &[Tier] = &[
    Tier { name: "S+", min_price: 200_000, color: "#DC2626", bg: "#FEF2F2", border: "#FECACA" },
    Tier { name: "S",  min_price: 150_000, color: "#EA580C", bg: "#FFF7ED", border: "#FED7AA" },
    Tier { name: "A+", min_price: 120_000, color: "#D97706", bg: "#FFFBEB", border: "#FDE68A" },
    Tier { name: "A",  min_price: 100_000, color: "#CA8A04", bg: "#FEFCE8", border: "#FEF08A" },
    Tier { name: "B+", min_price: 70_000,  color: "#65A30D", bg: "#F7FEE7", border: "#D9F99D" },
    Tier { name: "B",  min_price: 50_000,  color: "#16A34A", bg: "#F0FDF4", border: "#BBF7D0" },
    Tier { name: "C+", min_price: 40_000,  color: "#0D9488", bg: "#F0FDFA", border: "#99F6E4" },
    Tier { name: "C",  min_price: 30_000,  color: "#2563EB", bg: "#EFF6FF", border: "#BFDBFE" },
    Tier { name: "D",  min_price: 20_000,  color: "#7C3AED", bg: "#F5F3FF", border: "#DDD6FE" },
    Tier { name: "F",  min_price: 0,       color: "#64748B", bg: "#F8FAFC", border: "#E2E8F0" },
];

/// First band (top-down) whose inclusive minimum is ≤ `price`.
pub fn tier_for(price: i64) -> &'static Tier {
    TIERS
        .iter()
        .find(|t| price >= t.min_price)
        .unwrap_or(&TIERS[TIERS.len() - 1])
}
