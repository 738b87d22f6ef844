//! Read-only EVM access.
//!
//! Every read is batched through Multicall3 `aggregate3` with
//! `allowFailure` set, so a reverting call surfaces as `None` instead of
//! failing the whole batch. Transport and decoding failures of the batch
//! itself are errors.

use std::time::Duration;

use alloy_primitives::{Address, Uint, I256, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use alloy_transport_http::Http;
use async_trait::async_trait;
use bigdecimal::num_bigint::{BigInt, BigUint};
use futures::future::try_join_all;
use reqwest::Client;
use tracing::debug;

use crate::{
    chain::ChainId,
    configuration::ChainConfig,
    error::Error,
    model::{ExtendedPoolInfo, FarmConfig, FarmOnChain, FarmsOnChain, Slot0},
};

sol! {
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls)
            external payable returns (Result[] memory returnData);
    }
}

sol! {
    interface IExtendedPool {
        function slot0() external view returns (
            uint160 sqrtPriceX96, int24 tick, uint16 observationIndex,
            uint16 observationCardinality, uint16 observationCardinalityNext,
            uint32 feeProtocol, bool unlocked
        );
    }

    interface IChiefFarmerExtended {
        function poolInfo(uint256 pid) external view returns (
            uint256 allocPoint, address extendedPool, address token0,
            address token1, uint24 fee, uint256 totalLiquidity,
            uint256 totalBoostLiquidity
        );
        function extendedPoolAddressPid(address pool) external view returns (uint256);
    }

    interface IChiefFarmer {
        function poolLength() external view returns (uint256);
        function totalRegularAllocPoint() external view returns (uint256);
        function totalSpecialAllocPoint() external view returns (uint256);
        function wayaPerBlock(bool isRegular) external view returns (uint256);
        function poolInfo(uint256 pid) external view returns (
            uint256 accWayaPerShare, uint256 lastRewardBlock,
            uint256 allocPoint, uint256 totalBoostedShare, bool isRegular
        );
    }

    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function totalSupply() external view returns (uint256);
    }

    interface IPair {
        function getReserves() external view returns (
            uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast
        );
    }

    interface IAggregator {
        function latestAnswer() external view returns (int256);
    }
}

/// Maximum calls per aggregate3 batch
const MAX_CALLS_PER_BATCH: usize = 300;

/// Chief farmer totals leading every farms batch.
const CHAIN_CALLS: usize = 4;

/// Calls issued per farm by [`RpcReader::farms_on_chain`].
const CALLS_PER_FARM: usize = 5;

#[async_trait]
pub trait ChainReader: Send + Sync {
    /// `extendedPoolAddressPid(pool)` on the chief farmer extended contract.
    /// `None` when the call reverts.
    async fn extended_pool_pid(&self, pool: Address)
        -> Result<Option<u64>, Error>;

    /// `slot0()` of the pool and `poolInfo(pid)` of the chief farmer
    /// extended contract, read in one batch.
    async fn extended_pool_state(
        &self,
        pool: Address,
        pid: u64,
    ) -> Result<(Option<Slot0>, Option<ExtendedPoolInfo>), Error>;

    /// Chief farmer totals plus LP reserves and allocation of each farm, in
    /// the order of `farms`.
    async fn farms_on_chain(
        &self,
        farms: &[FarmConfig],
    ) -> Result<FarmsOnChain, Error>;

    async fn pair_reserves(
        &self,
        pair: Address,
    ) -> Result<(BigUint, BigUint), Error>;

    async fn latest_answer(&self, feed: Address) -> Result<BigInt, Error>;
}

pub struct RpcReader {
    chain: ChainId,
    config: ChainConfig,
    provider: RootProvider,
}

impl RpcReader {
    /// Every JSON-RPC request is bounded by `timeout`.
    pub fn new(
        chain: ChainId,
        config: ChainConfig,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let transport = Http::with_client(client, config.rpc_url.parse()?);
        let provider = RootProvider::new(RpcClient::new(transport, false));

        Ok(RpcReader {
            chain,
            config,
            provider,
        })
    }

    async fn aggregate(
        &self,
        calls: Vec<IMulticall3::Call3>,
    ) -> Result<Vec<IMulticall3::Result>, Error> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let expected = calls.len();
        let calldata = IMulticall3::aggregate3Call { calls }.abi_encode();
        let tx = TransactionRequest::default()
            .to(self.chain.multicall3())
            .input(calldata.into());

        let result = self.provider.call(tx).await.map_err(|e| {
            Error::RpcError(format!("multicall on {} failed: {}", self.chain, e))
        })?;

        let decoded = IMulticall3::aggregate3Call::abi_decode_returns(&result)?;

        if decoded.len() != expected {
            return Err(Error::RpcError(format!(
                "multicall on {} returned {} results for {} calls",
                self.chain,
                decoded.len(),
                expected
            )));
        }

        Ok(decoded)
    }

    async fn aggregate_chunked(
        &self,
        calls: Vec<IMulticall3::Call3>,
    ) -> Result<Vec<IMulticall3::Result>, Error> {
        let batches = calls
            .chunks(MAX_CALLS_PER_BATCH)
            .map(|chunk| self.aggregate(chunk.to_vec()));

        let results = try_join_all(batches).await?;
        Ok(results.into_iter().flatten().collect())
    }

    fn farm_calls(&self, farm: &FarmConfig) -> [IMulticall3::Call3; CALLS_PER_FARM] {
        let chief_farmer = self.config.chief_farmer;
        let lp = farm.lp_address;

        [
            call3(farm.token.address, IERC20::balanceOfCall { account: lp }),
            call3(
                farm.quote_token.address,
                IERC20::balanceOfCall { account: lp },
            ),
            call3(lp, IERC20::balanceOfCall {
                account: chief_farmer,
            }),
            call3(lp, IERC20::totalSupplyCall {}),
            call3(chief_farmer, IChiefFarmer::poolInfoCall {
                pid: U256::from(farm.pid.unwrap_or_default()),
            }),
        ]
    }
}

#[async_trait]
impl ChainReader for RpcReader {
    async fn extended_pool_pid(
        &self,
        pool: Address,
    ) -> Result<Option<u64>, Error> {
        let results = self
            .aggregate(vec![call3(
                self.config.chief_farmer_extended,
                IChiefFarmerExtended::extendedPoolAddressPidCall { pool },
            )])
            .await?;

        decode::<IChiefFarmerExtended::extendedPoolAddressPidCall>(&results[0])
            .map(|pid| {
                u64::try_from(pid).map_err(|_| {
                    Error::RpcError(format!("pid {} out of range", pid))
                })
            })
            .transpose()
    }

    async fn extended_pool_state(
        &self,
        pool: Address,
        pid: u64,
    ) -> Result<(Option<Slot0>, Option<ExtendedPoolInfo>), Error> {
        let results = self
            .aggregate(vec![
                call3(pool, IExtendedPool::slot0Call {}),
                call3(
                    self.config.chief_farmer_extended,
                    IChiefFarmerExtended::poolInfoCall {
                        pid: U256::from(pid),
                    },
                ),
            ])
            .await?;

        let slot0 =
            decode::<IExtendedPool::slot0Call>(&results[0]).map(|s| Slot0 {
                sqrt_price_x96: to_big_uint(s.sqrtPriceX96),
                tick: s.tick.as_i32(),
            });

        let pool_info =
            decode::<IChiefFarmerExtended::poolInfoCall>(&results[1]).map(
                |info| ExtendedPoolInfo {
                    alloc_point: to_big_uint(info.allocPoint),
                    total_liquidity: to_big_uint(info.totalLiquidity),
                },
            );

        Ok((slot0, pool_info))
    }

    async fn farms_on_chain(
        &self,
        farms: &[FarmConfig],
    ) -> Result<FarmsOnChain, Error> {
        let chief_farmer = self.config.chief_farmer;
        let mut calls = vec![
            call3(chief_farmer, IChiefFarmer::poolLengthCall {}),
            call3(chief_farmer, IChiefFarmer::totalRegularAllocPointCall {}),
            call3(chief_farmer, IChiefFarmer::totalSpecialAllocPointCall {}),
            call3(chief_farmer, IChiefFarmer::wayaPerBlockCall {
                isRegular: true,
            }),
        ];
        for farm in farms {
            calls.extend(self.farm_calls(farm));
        }

        let results = self.aggregate_chunked(calls).await?;
        let farms_on_chain = decode_farms_on_chain(self.chain, farms, &results)?;

        debug!("Read {} farms on {}", farms_on_chain.farms.len(), self.chain);

        Ok(farms_on_chain)
    }

    async fn pair_reserves(
        &self,
        pair: Address,
    ) -> Result<(BigUint, BigUint), Error> {
        let results = self
            .aggregate(vec![call3(pair, IPair::getReservesCall {})])
            .await?;

        decode::<IPair::getReservesCall>(&results[0])
            .map(|r| (to_big_uint(r.reserve0), to_big_uint(r.reserve1)))
            .ok_or_else(|| {
                Error::RpcError(format!("getReserves failed for {}", pair))
            })
    }

    async fn latest_answer(&self, feed: Address) -> Result<BigInt, Error> {
        let results = self
            .aggregate(vec![call3(feed, IAggregator::latestAnswerCall {})])
            .await?;

        decode::<IAggregator::latestAnswerCall>(&results[0])
            .map(to_big_int)
            .ok_or_else(|| {
                Error::RpcError(format!("latestAnswer failed for {}", feed))
            })
    }
}

/// Splits a farms batch into the chief farmer totals and one
/// [`CALLS_PER_FARM`] chunk per farm.
///
/// Reverted totals fail the batch; reverted per-farm reads count as zero.
fn decode_farms_on_chain(
    chain: ChainId,
    farms: &[FarmConfig],
    results: &[IMulticall3::Result],
) -> Result<FarmsOnChain, Error> {
    let expected = CHAIN_CALLS + farms.len() * CALLS_PER_FARM;
    if results.len() != expected {
        return Err(Error::RpcError(format!(
            "farms batch on {} has {} results, expected {}",
            chain,
            results.len(),
            expected
        )));
    }

    let (totals, per_farm) = results.split_at(CHAIN_CALLS);

    let required = |value: Option<U256>, name: &str| {
        value.map(to_big_uint).ok_or_else(|| {
            Error::RpcError(format!("{} failed on {}", name, chain))
        })
    };

    let pool_length = required(
        decode::<IChiefFarmer::poolLengthCall>(&totals[0]),
        "poolLength",
    )?;
    let total_regular_alloc_point = required(
        decode::<IChiefFarmer::totalRegularAllocPointCall>(&totals[1]),
        "totalRegularAllocPoint",
    )?;
    let total_special_alloc_point = required(
        decode::<IChiefFarmer::totalSpecialAllocPointCall>(&totals[2]),
        "totalSpecialAllocPoint",
    )?;
    let regular_waya_per_block = required(
        decode::<IChiefFarmer::wayaPerBlockCall>(&totals[3]),
        "wayaPerBlock",
    )?;

    let balance = |result: &IMulticall3::Result| {
        decode::<IERC20::balanceOfCall>(result)
            .map(to_big_uint)
            .unwrap_or_default()
    };

    let farms = farms
        .iter()
        .zip(per_farm.chunks(CALLS_PER_FARM))
        .map(|(farm, results)| {
            let pool_info = farm
                .pid
                .and_then(|_| decode::<IChiefFarmer::poolInfoCall>(&results[4]));

            FarmOnChain {
                token_balance_lp: balance(&results[0]),
                quote_token_balance_lp: balance(&results[1]),
                lp_token_balance_mc: balance(&results[2]),
                lp_total_supply: decode::<IERC20::totalSupplyCall>(&results[3])
                    .map(to_big_uint)
                    .unwrap_or_default(),
                alloc_point: pool_info
                    .as_ref()
                    .map(|info| to_big_uint(info.allocPoint))
                    .unwrap_or_default(),
                is_regular: pool_info.map(|info| info.isRegular).unwrap_or(true),
            }
        })
        .collect::<Vec<FarmOnChain>>();

    Ok(FarmsOnChain {
        pool_length: u64::try_from(&pool_length).map_err(|_| {
            Error::RpcError(format!("poolLength {} out of range", pool_length))
        })?,
        total_regular_alloc_point,
        total_special_alloc_point,
        regular_waya_per_block,
        farms,
    })
}

fn call3<C: SolCall>(target: Address, call: C) -> IMulticall3::Call3 {
    IMulticall3::Call3 {
        target,
        allowFailure: true,
        callData: call.abi_encode().into(),
    }
}

/// Decodes the return data of a successful call.
fn decode<C: SolCall>(result: &IMulticall3::Result) -> Option<C::Return> {
    if !result.success {
        return None;
    }

    C::abi_decode_returns(&result.returnData).ok()
}

pub fn to_big_uint<const BITS: usize, const LIMBS: usize>(
    value: Uint<BITS, LIMBS>,
) -> BigUint {
    BigUint::from_bytes_le(&value.to_le_bytes_vec())
}

pub fn to_big_int(value: I256) -> BigInt {
    let (sign, abs) = value.into_sign_and_abs();
    let magnitude = BigInt::from(to_big_uint(abs));

    if sign.is_negative() {
        -magnitude
    } else {
        magnitude
    }
}
