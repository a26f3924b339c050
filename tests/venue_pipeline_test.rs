//! Decode → quote → build over the public API

#[cfg(test)]
mod pipeline_tests {
    use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Keypair, signer::Signer};
    use venue_router::codec::{pump_curve, PoolState, PumpAmmPool, PumpBondingCurve};
    use venue_router::quote::{quote_trade, QuoteError};
    use venue_router::tx_builder::{
        accounts::{pump_amm, token_program, WSOL_MINT},
        assemble_transaction, plan_trade, PumpAmmAccounts, PumpCurveAccounts, TradeParams,
        VenueAccounts,
    };
    use venue_router::types::{TradeSide, Venue};

    fn launch_curve() -> PumpBondingCurve {
        PumpBondingCurve {
            virtual_token_reserves: 1_073_000_000_000_000,
            virtual_sol_reserves: 30_000_000_000,
            real_token_reserves: 793_100_000_000_000,
            real_sol_reserves: 1_000_000_000,
            token_total_supply: 1_000_000_000_000_000,
            complete: false,
            creator: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_curve_buy_from_raw_bytes() {
        let bytes = launch_curve().encode();
        let state = pump_curve::decode(&bytes).unwrap();

        let quote = quote_trade(Venue::PumpCurve, &state, TradeSide::Buy, 1_000_000_000, 100, 4_500, 0).unwrap();
        assert_eq!(quote.amount_out, 34_277_831_558_567);
        assert_eq!(quote.minimum_amount_out, 18_852_807_357_211);
        assert_eq!(quote.venue, Venue::PumpCurve);
    }

    #[test]
    fn test_curve_sell_from_raw_bytes() {
        let state = pump_curve::decode(&launch_curve().encode()).unwrap();

        let quote = quote_trade(Venue::PumpCurve, &state, TradeSide::Sell, 10_000_000_000_000, 100, 0, 0).unwrap();
        assert_eq!(quote.amount_out, 274_263_551);
        assert_eq!(quote.minimum_amount_out, quote.amount_out);
    }

    #[test]
    fn test_truncated_account_is_rejected() {
        let bytes = launch_curve().encode();
        assert!(pump_curve::decode(&bytes[..40]).is_err());
    }

    #[test]
    fn test_dust_buy_is_zero_output() {
        let state = pump_curve::decode(&launch_curve().encode()).unwrap();
        assert_eq!(
            quote_trade(Venue::PumpCurve, &state, TradeSide::Buy, 1, 100, 0, 0),
            Err(QuoteError::ZeroOutput)
        );
    }

    #[test]
    fn test_pool_quote_to_signed_transaction() {
        let mint = Pubkey::new_unique();
        let pool = PumpAmmPool {
            pool_bump: 254,
            index: pump_amm::CANONICAL_POOL_INDEX,
            creator: Pubkey::new_unique(),
            base_mint: mint,
            quote_mint: WSOL_MINT,
            lp_mint: Pubkey::new_unique(),
            pool_base_token_account: Pubkey::new_unique(),
            pool_quote_token_account: Pubkey::new_unique(),
            lp_supply: 1,
            coin_creator: Pubkey::new_unique(),
        };
        let decoded = PumpAmmPool::decode(&pool.encode()).unwrap();
        assert_eq!(decoded, pool);

        let address = pump_amm::canonical_pool(&mint);
        let state = decoded.to_state(address, pump_amm::fee_config(), 200_000_000_000_000, 80_000_000_000);
        let quote = quote_trade(
            Venue::PumpAmm,
            &PoolState::Pool(state),
            TradeSide::Buy,
            500_000_000,
            25,
            3_500,
            0,
        )
        .unwrap();
        assert!(quote.minimum_amount_out < quote.amount_out);

        let payer = Keypair::new();
        let accounts = VenueAccounts::PumpAmm(PumpAmmAccounts::from_state(&state, token_program()));
        let plan = plan_trade(
            &accounts,
            &payer.pubkey(),
            &TradeParams {
                side: TradeSide::Buy,
                amount_in: quote.amount_in,
                minimum_amount_out: quote.minimum_amount_out,
                compute_unit_limit: 200_000,
                priority_fee_micro: 100_000,
            },
        )
        .unwrap();
        let trade = plan.trade_instruction().unwrap();
        assert_eq!(trade.program_id, pump_amm::PROGRAM_ID);
        assert_eq!(trade.accounts[0].pubkey, address);

        let tx = assemble_transaction(&payer, &plan.instructions, Hash::new_unique()).unwrap();
        assert_eq!(tx.signatures.len(), 1);
    }

    #[test]
    fn test_curve_accounts_follow_mint() {
        let curve = launch_curve();
        let mint = Pubkey::new_unique();
        let a = PumpCurveAccounts::new(mint, curve.creator, token_program());
        let b = PumpCurveAccounts::new(mint, curve.creator, token_program());
        assert_eq!(a, b);
        assert_eq!(VenueAccounts::PumpCurve(a).venue(), Venue::PumpCurve);
    }
}
