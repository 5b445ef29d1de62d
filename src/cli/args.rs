//! Argument groups for the write subcommands

use clap::Args;
use rust_decimal::Decimal;

use crate::services::{GeoFilter, NewAccount, NewCustomer, QuickSend};
use crate::types::{AccountType, Address, Result};

/// Create a customer
#[derive(Args, Debug)]
pub struct CreateCustomerArgs {
    #[arg(long)]
    pub first: String,

    #[arg(long)]
    pub last: String,

    #[arg(long)]
    pub street_number: String,

    #[arg(long)]
    pub street_name: String,

    #[arg(long)]
    pub city: String,

    /// Two-letter state code
    #[arg(long)]
    pub state: String,

    #[arg(long)]
    pub zip: String,
}

impl From<CreateCustomerArgs> for NewCustomer {
    fn from(args: CreateCustomerArgs) -> Self {
        NewCustomer {
            first_name: args.first,
            last_name: args.last,
            address: Address {
                street_number: args.street_number,
                street_name: args.street_name,
                city: args.city,
                state: args.state,
                zip: args.zip,
            },
        }
    }
}

/// Open an account for a customer
#[derive(Args, Debug)]
pub struct CreateAccountArgs {
    /// Owning customer ID
    #[arg(long)]
    pub customer: String,

    #[arg(long = "type", value_enum)]
    pub account_type: AccountType,

    #[arg(long)]
    pub nickname: String,

    /// Opening balance
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub balance: Decimal,

    #[arg(long, default_value_t = 0)]
    pub rewards: u32,
}

impl CreateAccountArgs {
    pub fn to_request(&self) -> NewAccount {
        NewAccount {
            account_type: self.account_type,
            nickname: self.nickname.clone(),
            rewards: self.rewards,
            balance: self.balance,
        }
    }
}

/// Quick-send money to another account
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Paying account ID
    #[arg(long)]
    pub from: String,

    /// Payee account ID
    #[arg(long)]
    pub to: String,

    #[arg(long, allow_negative_numbers = true)]
    pub amount: Decimal,

    #[arg(long)]
    pub description: Option<String>,
}

impl From<SendArgs> for QuickSend {
    fn from(args: SendArgs) -> Self {
        QuickSend {
            from_account: args.from,
            payee_account: args.to,
            amount: args.amount,
            description: args.description,
        }
    }
}

/// Optional search area for ATM and branch listings
#[derive(Args, Debug)]
pub struct LocateArgs {
    /// Latitude of the search center
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of the search center
    #[arg(long, allow_negative_numbers = true)]
    pub lng: Option<f64>,

    /// Search radius in miles
    #[arg(long)]
    pub rad: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl LocateArgs {
    pub fn filter(&self) -> Result<Option<GeoFilter>> {
        GeoFilter::from_parts(self.lat, self.lng, self.rad)
    }
}
