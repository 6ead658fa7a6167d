#![deny(warnings)]

//! Economic models for Freight Tycoon: transport orders and the game clock.
//!
//! This crate provides:
//! - [`OrderBook`]: seeded order generation and the order lifecycle
//!   (Pending -> Assigned -> Completed)
//! - [`Economy`]: cash, the day counter and the end-of-game horizon

mod orders;

pub use orders::{Order, OrderBook, OrderStatus, Product};

use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use sim_core::{GraphMap, Node, NodeKind, OrderId};
use thiserror::Error;
use tracing::info;

/// Errors produced by economy and order operations.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// No farm, or no market/distribution center, to build an order from.
    #[error("map needs at least one farm and one market or distribution center")]
    InsufficientNodes,
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),
    #[error("{0} is already assigned")]
    OrderAlreadyAssigned(OrderId),
    /// Completion requested for an order no truck is carrying.
    #[error("{0} has not been assigned")]
    OrderNotAssigned(OrderId),
    #[error("insufficient funds: need {cost}, have {available}")]
    InsufficientFunds { cost: Decimal, available: Decimal },
    #[error("no farm to place a truck on")]
    NoFarmAvailable,
    #[error("game over")]
    GameOver,
}

/// Uniformly pick one farm.
pub fn pick_farm<'a, R: Rng + ?Sized>(graph: &'a GraphMap, rng: &mut R) -> Result<&'a Node, EconError> {
    graph
        .nodes_of_kind(NodeKind::is_supply)
        .choose(rng)
        .copied()
        .ok_or(EconError::NoFarmAvailable)
}

/// Read-only economy view for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EconomyState {
    pub money: Decimal,
    pub day: u32,
    pub total_days: u32,
    pub game_over: bool,
}

/// Cash and calendar. The game runs from day 1 until the day counter passes
/// `total_days`; after that every mutating command fails with `GameOver`.
#[derive(Clone, Debug)]
pub struct Economy {
    money: Decimal,
    starting_money: Decimal,
    day: u32,
    total_days: u32,
}

impl Economy {
    pub fn new(starting_money: Decimal, total_days: u32) -> Self {
        Self {
            money: starting_money,
            starting_money,
            day: 1,
            total_days,
        }
    }

    pub fn money(&self) -> Decimal {
        self.money
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn total_days(&self) -> u32 {
        self.total_days
    }

    /// Money earned (or lost) since day 1.
    pub fn profit(&self) -> Decimal {
        self.money - self.starting_money
    }

    pub fn is_game_over(&self) -> bool {
        self.day > self.total_days
    }

    pub fn ensure_running(&self) -> Result<(), EconError> {
        if self.is_game_over() {
            return Err(EconError::GameOver);
        }
        Ok(())
    }

    /// Move to the next day and return it.
    pub fn advance_day(&mut self) -> Result<u32, EconError> {
        self.ensure_running()?;
        self.day += 1;
        if self.is_game_over() {
            info!(day = self.day, money = %self.money, profit = %self.profit(), "game over");
        } else {
            info!(day = self.day, "new day");
        }
        Ok(self.day)
    }

    pub fn credit(&mut self, amount: Decimal) {
        self.money += amount;
    }

    /// Take `cost` out of the cash balance; never lets money go negative.
    pub fn debit(&mut self, cost: Decimal) -> Result<(), EconError> {
        if self.money < cost {
            return Err(EconError::InsufficientFunds {
                cost,
                available: self.money,
            });
        }
        self.money -= cost;
        Ok(())
    }

    pub fn state(&self) -> EconomyState {
        EconomyState {
            money: self.money,
            day: self.day,
            total_days: self.total_days,
            game_over: self.is_game_over(),
        }
    }
}
