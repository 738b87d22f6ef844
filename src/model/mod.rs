pub use self::{
    farm::{
        AprMap, FarmConfig, FarmOnChain, FarmWithApr, FarmWithPrices,
        FarmsOnChain, SavedFarmResult, SerializedToken,
    },
    farm_record::FarmRecord,
    liquidity::{
        ExtendedLiquidityResult, ExtendedPoolInfo, FormattedAmounts,
        IndexedPool, IndexedToken, LiquidityPosition, PoolState, PositionsPage,
        Slot0, TokenAmounts,
    },
    table::Table,
};

mod farm;
mod farm_record;
mod liquidity;
mod table;
