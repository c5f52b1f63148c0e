//! Tagged pool representation
//!
//! [`Pool`] couples identity (id, ordered assets, fee) with a
//! [`CurveState`] variant. Adding a protocol means adding a variant and its
//! [`AmmPool`] impl; call sites only see `Pool`.

use crate::config::CurveConfig;
use crate::error::{AmmError, Result};
use crate::pool_traits::{AmmPool, SwapContext};
use crate::stable_math::StablePoolState;
use crate::v2_math::V2PoolState;
use crate::v3_math::V3PoolState;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::{Asset, AssetId, FeeRate, PoolId, Protocol};

/// Protocol-specific reserve/curve-parameter state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveState {
    ConstantProduct(V2PoolState),
    ConcentratedLiquidity(V3PoolState),
    StableSwap(StablePoolState),
}

impl CurveState {
    pub fn protocol(&self) -> Protocol {
        self.as_amm().protocol()
    }

    pub fn as_amm(&self) -> &dyn AmmPool {
        match self {
            CurveState::ConstantProduct(state) => state,
            CurveState::ConcentratedLiquidity(state) => state,
            CurveState::StableSwap(state) => state,
        }
    }
}

/// Quote for one directed hop through a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub pool_id: PoolId,
    pub asset_in: AssetId,
    pub asset_out: AssetId,
    pub amount_in: u128,
    pub amount_out: u128,
    pub fee_asset: AssetId,
    pub fee_amount: u128,
}

/// A liquidity pool over an ordered asset pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub assets: [Asset; 2],
    pub fee: FeeRate,
    pub curve: CurveState,
}

impl Pool {
    pub fn new(id: PoolId, assets: [Asset; 2], fee: FeeRate, curve: CurveState) -> Result<Self> {
        let pool = Self {
            id,
            assets,
            fee,
            curve,
        };
        pool.validate()?;
        Ok(pool)
    }

    #[inline]
    pub fn protocol(&self) -> Protocol {
        self.curve.protocol()
    }

    #[inline]
    pub fn decimals(&self) -> [u8; 2] {
        [self.assets[0].decimals, self.assets[1].decimals]
    }

    /// Re-check every pool invariant
    pub fn validate(&self) -> Result<()> {
        for asset in &self.assets {
            asset.validate()?;
        }
        if self.assets[0].id == self.assets[1].id {
            return Err(AmmError::InvalidInput(format!(
                "pool {} trades {} against itself",
                self.id, self.assets[0].id
            )));
        }
        self.curve.as_amm().validate(self.decimals())
    }

    pub fn contains(&self, asset: &AssetId) -> bool {
        self.assets.iter().any(|a| &a.id == asset)
    }

    /// Trade direction for `source`: true when selling asset 0
    pub fn zero_for_one(&self, source: &AssetId) -> Result<bool> {
        if &self.assets[0].id == source {
            Ok(true)
        } else if &self.assets[1].id == source {
            Ok(false)
        } else {
            Err(AmmError::InvalidInput(format!(
                "asset {} is not traded by pool {}",
                source, self.id
            )))
        }
    }

    pub fn asset_in(&self, zero_for_one: bool) -> &Asset {
        &self.assets[if zero_for_one { 0 } else { 1 }]
    }

    pub fn asset_out(&self, zero_for_one: bool) -> &Asset {
        &self.assets[if zero_for_one { 1 } else { 0 }]
    }

    fn context<'a>(&self, zero_for_one: bool, config: &'a CurveConfig) -> SwapContext<'a> {
        SwapContext {
            zero_for_one,
            fee: self.fee,
            decimals: self.decimals(),
            config,
        }
    }

    /// Exact output for selling `amount_in` of `source`
    pub fn quote_output(
        &self,
        source: &AssetId,
        amount_in: u128,
        config: &CurveConfig,
    ) -> Result<SwapQuote> {
        self.quote_directed(self.zero_for_one(source)?, amount_in, config)
    }

    pub fn quote_directed(
        &self,
        zero_for_one: bool,
        amount_in: u128,
        config: &CurveConfig,
    ) -> Result<SwapQuote> {
        let ctx = self.context(zero_for_one, config);
        let quote = self.curve.as_amm().quote_output(&ctx, amount_in)?;
        let asset_in = self.asset_in(zero_for_one).id.clone();
        let asset_out = self.asset_out(zero_for_one).id.clone();
        let fee_asset = if quote.fee_on_input {
            asset_in.clone()
        } else {
            asset_out.clone()
        };
        Ok(SwapQuote {
            pool_id: self.id.clone(),
            asset_in,
            asset_out,
            amount_in,
            amount_out: quote.amount_out,
            fee_asset,
            fee_amount: quote.fee_amount,
        })
    }

    /// Non-negative relative gap between spot and execution price
    pub fn price_impact(
        &self,
        source: &AssetId,
        amount_in: u128,
        config: &CurveConfig,
    ) -> Result<Decimal> {
        let ctx = self.context(self.zero_for_one(source)?, config);
        self.curve.as_amm().price_impact(&ctx, amount_in)
    }

    /// Instantaneous marginal price of `source` in the other asset, fee excluded
    pub fn spot_price(&self, source: &AssetId, config: &CurveConfig) -> Result<Decimal> {
        self.spot_price_directed(self.zero_for_one(source)?, config)
    }

    pub fn spot_price_directed(&self, zero_for_one: bool, config: &CurveConfig) -> Result<Decimal> {
        self.curve
            .as_amm()
            .spot_price(&self.context(zero_for_one, config))
    }

    /// Best-case rate of an infinitesimal trade: spot price net of fee
    pub fn marginal_rate(&self, zero_for_one: bool, config: &CurveConfig) -> Result<Decimal> {
        let spot = self.spot_price_directed(zero_for_one, config)?;
        spot.checked_mul(Decimal::ONE - self.fee.as_decimal())
            .ok_or(AmmError::NumericOverflow("marginal rate"))
    }

    /// Largest input accepted by [`Pool::quote_output`] for `source`
    pub fn max_input(&self, source: &AssetId, config: &CurveConfig) -> Result<u128> {
        self.max_input_directed(self.zero_for_one(source)?, config)
    }

    pub fn max_input_directed(&self, zero_for_one: bool, config: &CurveConfig) -> Result<u128> {
        self.curve
            .as_amm()
            .max_input(&self.context(zero_for_one, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Q96;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn asset(id: &str, decimals: u8) -> Asset {
        Asset::new(AssetId::new(id), decimals).unwrap()
    }

    fn cp_pool(r0: u128, r1: u128, fee_pips: u32) -> Pool {
        Pool::new(
            PoolId::new("cp"),
            [asset("ETH", 18), asset("USDC", 6)],
            FeeRate::from_pips(fee_pips).unwrap(),
            CurveState::ConstantProduct(V2PoolState::new(r0, r1).unwrap()),
        )
        .unwrap()
    }

    fn stable_pool(balance: u128) -> Pool {
        Pool::new(
            PoolId::new("stable"),
            [asset("USDC", 6), asset("USDT", 6)],
            FeeRate::from_pips(400).unwrap(),
            CurveState::StableSwap(StablePoolState {
                balances: [balance, balance],
                amplification: 200,
            }),
        )
        .unwrap()
    }

    fn cl_pool() -> Pool {
        let liquidity = 10_000_000_000_000_000_000u128;
        Pool::new(
            PoolId::new("cl"),
            [asset("WETH", 18), asset("DAI", 18)],
            FeeRate::from_pips(3_000).unwrap(),
            CurveState::ConcentratedLiquidity(V3PoolState {
                sqrt_price_x96: Q96,
                tick: 0,
                liquidity,
                ticks: BTreeMap::from([(-6_000, liquidity as i128), (6_000, -(liquidity as i128))]),
            }),
        )
        .unwrap()
    }

    /// Nested positions: 2L active at price 1, L out to ticks -12000 and 12000
    fn cl_tiered_pool() -> Pool {
        let liquidity = 10_000_000_000_000_000_000i128;
        Pool::new(
            PoolId::new("cl-tiered"),
            [asset("WETH", 18), asset("DAI", 18)],
            FeeRate::from_pips(3_000).unwrap(),
            CurveState::ConcentratedLiquidity(V3PoolState {
                sqrt_price_x96: Q96,
                tick: 0,
                liquidity: 2 * liquidity as u128,
                ticks: BTreeMap::from([
                    (-12_000, liquidity),
                    (-6_000, liquidity),
                    (6_000, -liquidity),
                    (12_000, -liquidity),
                ]),
            }),
        )
        .unwrap()
    }

    /// Above rounding dust for a virtual reserve of 2e19
    const CL_DUST_FLOOR: u128 = 100_000_000_000;

    #[test]
    fn test_unknown_asset_is_invalid_input() {
        let pool = cp_pool(1_000_000, 2_000_000, 3_000);
        assert!(matches!(
            pool.quote_output(&AssetId::new("DAI"), 10, &CurveConfig::default()),
            Err(AmmError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_non_positive_reserve_rejected() {
        let result = Pool::new(
            PoolId::new("bad"),
            [asset("A", 18), asset("B", 18)],
            FeeRate::ZERO,
            CurveState::ConstantProduct(V2PoolState {
                reserve0: 0,
                reserve1: 10,
            }),
        );
        assert!(matches!(result, Err(AmmError::InvalidInput(_))));
    }

    #[test]
    fn test_safe_fraction_bound_enforced() {
        let config = CurveConfig::default();
        let pool = cp_pool(100_000, 200_000, 3_000);
        let eth = AssetId::new("ETH");
        assert_eq!(pool.max_input(&eth, &config).unwrap(), 30_000);
        assert!(pool.quote_output(&eth, 30_000, &config).is_ok());
        assert!(matches!(
            pool.quote_output(&eth, 30_001, &config),
            Err(AmmError::InsufficientLiquidity(_))
        ));
    }

    #[test]
    fn test_reserve_drop_turns_large_quote_into_insufficient_liquidity() {
        let config = CurveConfig::default();
        let eth = AssetId::new("ETH");
        let before = cp_pool(100_000, 200_000, 3_000);
        assert!(before.quote_output(&eth, 25_000, &config).is_ok());

        // Same pool after an update drains the input-side reserve
        let after = cp_pool(80_000, 250_000, 3_000);
        assert!(matches!(
            after.quote_output(&eth, 25_000, &config),
            Err(AmmError::InsufficientLiquidity(_))
        ));
    }

    #[test]
    fn test_quote_reports_fee_asset() {
        let config = CurveConfig::default();
        let quote = cp_pool(1_000_000, 2_000_000, 3_000)
            .quote_output(&AssetId::new("USDC"), 10_000, &config)
            .unwrap();
        assert_eq!(quote.asset_out, AssetId::new("ETH"));
        assert_eq!(quote.fee_asset, AssetId::new("USDC"));
        assert_eq!(quote.fee_amount, 30);

        let stable = stable_pool(1_000_000_000_000);
        let quote = stable
            .quote_output(&AssetId::new("USDC"), 1_000_000, &config)
            .unwrap();
        assert_eq!(quote.fee_asset, AssetId::new("USDT"));
    }

    #[test]
    fn test_marginal_rate_applies_fee() {
        let config = CurveConfig::default();
        let pool = cp_pool(100_000, 200_000, 3_000);
        assert_eq!(pool.marginal_rate(true, &config).unwrap(), Decimal::new(1994, 3));
    }

    #[test]
    fn test_stable_impact_small_then_rising() {
        let config = CurveConfig::default();
        let pool = stable_pool(10_000_000_000_000);
        let usdc = AssetId::new("USDC");
        let small = pool.price_impact(&usdc, 1_000_000_000, &config).unwrap();
        let large = pool.price_impact(&usdc, 2_500_000_000_000, &config).unwrap();
        // Small trades pay little more than the 4 bps fee
        assert!(small < Decimal::new(5, 4), "small impact {small}");
        assert!(large > small);
    }

    #[test]
    fn test_concentrated_round_trip_loses_value() {
        let config = CurveConfig::default();
        let pool = cl_pool();
        let weth = AssetId::new("WETH");
        let dai = AssetId::new("DAI");
        let amount = 1_000_000_000_000_000_000u128;
        let out = pool.quote_output(&weth, amount, &config).unwrap();
        let back = pool.quote_output(&dai, out.amount_out, &config).unwrap();
        assert!(back.amount_out < amount);
    }

    #[test]
    fn test_open_ended_concentrated_pool_rejects_oversized_input() {
        let config = CurveConfig::default();
        let liquidity = 1_000_000_000_000_000_000u128;
        let pool = Pool::new(
            PoolId::new("cl-open"),
            [asset("WETH", 18), asset("DAI", 18)],
            FeeRate::from_pips(3_000).unwrap(),
            CurveState::ConcentratedLiquidity(V3PoolState {
                sqrt_price_x96: Q96,
                tick: 0,
                liquidity,
                ticks: BTreeMap::new(),
            }),
        )
        .unwrap();
        let weth = AssetId::new("WETH");

        let max_input = pool.max_input(&weth, &config).unwrap();
        assert!(max_input < liquidity);
        assert!(pool.quote_output(&weth, max_input, &config).is_ok());
        assert!(matches!(
            pool.quote_output(&weth, liquidity * liquidity, &config),
            Err(AmmError::InsufficientLiquidity(_))
        ));
        assert!(matches!(
            pool.quote_output(&weth, max_input + 1, &config),
            Err(AmmError::InsufficientLiquidity(_))
        ));
    }

    #[test]
    fn test_concentrated_impact_rises_across_tick_crossing() {
        let config = CurveConfig::default();
        let pool = cl_tiered_pool();
        for source in [AssetId::new("WETH"), AssetId::new("DAI")] {
            let max_input = pool.max_input(&source, &config).unwrap();
            let mut previous = Decimal::ZERO;
            let mut amount = CL_DUST_FLOOR;
            while amount <= max_input {
                let impact = pool.price_impact(&source, amount, &config).unwrap();
                assert!(impact >= previous, "{source} impact fell at {amount}");
                previous = impact;
                amount = amount * 3 / 2 + 1;
            }
            // Large trades pay far beyond the fee
            assert!(previous > Decimal::new(2, 1), "{source} final impact {previous}");
        }
    }

    #[test]
    fn test_pool_json_round_trip() {
        let pool = cl_pool();
        let json = serde_json::to_string(&pool).unwrap();
        assert!(json.contains("concentrated_liquidity"));
        let back: Pool = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pool);
    }

    fn pools() -> impl Strategy<Value = Pool> {
        (1_000_000_000_000u128..1_000_000_000_000_000_000_000_000, 1u128..1_000, 0u32..10_000)
            .prop_map(|(reserve_in, ratio, fee)| cp_pool(reserve_in, reserve_in * ratio / 10 + 1, fee))
    }

    proptest! {
        #[test]
        fn prop_cp_output_increasing_and_concave(
            pool in pools(),
            fraction_ppm in 1_000u128..70_000,
        ) {
            let config = CurveConfig::default();
            let eth = AssetId::new("ETH");
            let reserve = match &pool.curve {
                CurveState::ConstantProduct(state) => state.reserve0,
                _ => unreachable!(),
            };
            let x = reserve * fraction_ppm / 1_000_000;
            let out = |amount: u128| pool.quote_output(&eth, amount, &config).unwrap().amount_out;
            let (y1, y2, y4) = (out(x), out(2 * x), out(4 * x));
            prop_assert!(y1 < y2 && y2 < y4);
            // Successive doublings gain less each time
            prop_assert!(y4 - y2 <= 2 * (y2 - y1) + 3);
        }

        #[test]
        fn prop_cp_impact_non_negative_and_monotone(
            pool in pools(),
            fraction_ppm in 1_000u128..140_000,
        ) {
            let config = CurveConfig::default();
            let eth = AssetId::new("ETH");
            let reserve = match &pool.curve {
                CurveState::ConstantProduct(state) => state.reserve0,
                _ => unreachable!(),
            };
            let x = reserve * fraction_ppm / 1_000_000;
            let small = pool.price_impact(&eth, x, &config).unwrap();
            let large = pool.price_impact(&eth, 2 * x, &config).unwrap();
            prop_assert!(small >= Decimal::ZERO);
            prop_assert!(large >= small);
        }

        #[test]
        fn prop_round_trip_never_gains(
            pool in pools(),
            fraction_ppm in 1u128..100_000,
        ) {
            let config = CurveConfig::default();
            let eth = AssetId::new("ETH");
            let usdc = AssetId::new("USDC");
            let reserve = match &pool.curve {
                CurveState::ConstantProduct(state) => state.reserve0,
                _ => unreachable!(),
            };
            let x = (reserve * fraction_ppm / 1_000_000).max(1);
            let there = pool.quote_output(&eth, x, &config).unwrap();
            if there.amount_out > 0 {
                if let Ok(back) = pool.quote_output(&usdc, there.amount_out, &config) {
                    prop_assert!(back.amount_out <= x);
                }
            }
        }

        #[test]
        fn prop_cl_impact_monotone(
            amount in CL_DUST_FLOOR..5_000_000_000_000_000_000,
            zero_for_one in any::<bool>(),
        ) {
            let config = CurveConfig::default();
            let pool = cl_tiered_pool();
            let source = pool.asset_in(zero_for_one).id.clone();
            let small = pool.price_impact(&source, amount, &config).unwrap();
            let large = pool.price_impact(&source, 2 * amount, &config).unwrap();
            prop_assert!(small >= Decimal::ZERO);
            prop_assert!(large >= small);
        }

        #[test]
        fn prop_stable_impact_monotone(balance_units in 1_000_000u128..100_000_000, pct in 1u128..140) {
            let config = CurveConfig::default();
            let pool = stable_pool(balance_units * 1_000_000);
            let usdc = AssetId::new("USDC");
            let x = balance_units * 1_000_000 * pct / 1_000;
            let small = pool.price_impact(&usdc, x, &config).unwrap();
            let large = pool.price_impact(&usdc, 2 * x, &config).unwrap();
            prop_assert!(small >= Decimal::ZERO);
            prop_assert!(large >= small);
        }
    }
}
