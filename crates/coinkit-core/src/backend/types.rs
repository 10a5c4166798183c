//! Request and response bodies for the platform backend REST API.
//!
//! Response types are lenient: every field the smoke run reads is optional
//! so that a partially populated answer still decodes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ==============================================================================
// Requests
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewToken {
    pub name: String,
    pub description: String,
    pub full_description: String,
    pub category: String,
    pub tier: String,
    pub initial_amount: f64,
    pub social_links: Vec<SocialLink>,
    pub image_url: Option<String>,
    pub bonding_curve_config: BondingCurveConfig,
    pub vesting_config: Option<Value>,
}

impl NewToken {
    /// The throwaway token created by the API smoke run.
    pub fn smoke_sample() -> Self {
        Self {
            name: "Test Token".to_owned(),
            description: "A test token for API testing".to_owned(),
            full_description: "This is a comprehensive test token created via the API".to_owned(),
            category: "Wild".to_owned(),
            tier: "Tier1".to_owned(),
            initial_amount: 100.0,
            social_links: vec![
                SocialLink {
                    link_type: "twitter".to_owned(),
                    url: "https://twitter.com/testtoken".to_owned(),
                },
                SocialLink {
                    link_type: "website".to_owned(),
                    url: "https://testtoken.com".to_owned(),
                },
            ],
            image_url: None,
            bonding_curve_config: BondingCurveConfig {
                initial_price: 0.1,
                slope: 0.001,
                liquidity_threshold: 50_000.0,
                deadline: "2024-12-31T23:59:59Z".to_owned(),
                escrow_address: "escrow_test_123".to_owned(),
            },
            vesting_config: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialLink {
    pub link_type: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BondingCurveConfig {
    pub initial_price: f64,
    pub slope: f64,
    pub liquidity_threshold: f64,
    pub deadline: String,
    pub escrow_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discussion {
    pub id: String,
    pub title: String,
    pub author: String,
    pub content: String,
    pub comments: u32,
    pub latest_comment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Discussion {
    pub fn smoke_sample() -> Self {
        Self {
            id: "disc_1".to_owned(),
            title: "Test Discussion".to_owned(),
            author: "TestUser".to_owned(),
            content: "This is a test discussion created via the API".to_owned(),
            comments: 0,
            latest_comment: None,
            created_at: "2024-01-01T00:00:00Z".to_owned(),
            updated_at: "2024-01-01T00:00:00Z".to_owned(),
        }
    }
}

// ==============================================================================
// Responses
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenSummary {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub pub_address: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub involvement: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenList {
    #[serde(default)]
    pub tokens: Vec<TokenSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreatedToken {
    #[serde(default)]
    pub token: TokenSummary,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RewardPool {
    #[serde(default)]
    pub total_staked: Option<f64>,
    #[serde(default)]
    pub contributors: Vec<Value>,
}
