// Auction-wide summary figures derived from the player list.

use crate::model::{Player, PlayerStatus};

/// The highest price paid so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopSale {
    pub player_name: String,
    pub price: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuctionSummary {
    pub total_players: usize,
    pub sold: usize,
    pub unsold: usize,
    pub available: usize,
    pub total_spent: u64,
    pub highest_sale: Option<TopSale>,
    /// Mean sale price, rounded down. `None` until somebody is sold.
    pub average_sale: Option<u64>,
}

impl AuctionSummary {
    pub fn from_players(players: &[Player]) -> Self {
        let mut summary = AuctionSummary {
            total_players: players.len(),
            ..Default::default()
        };

        for player in players {
            match player.status {
                PlayerStatus::Sold => {
                    summary.sold += 1;
                    let price = player.sold_price.unwrap_or(0);
                    summary.total_spent += price;
                    let is_higher = summary
                        .highest_sale
                        .as_ref()
                        .map_or(true, |top| price > top.price);
                    if is_higher {
                        summary.highest_sale = Some(TopSale {
                            player_name: player.name.clone(),
                            price,
                        });
                    }
                }
                PlayerStatus::Unsold => summary.unsold += 1,
                PlayerStatus::Available => summary.available += 1,
                PlayerStatus::Current => {}
            }
        }

        if summary.sold > 0 {
            summary.average_sale = Some(summary.total_spent / summary.sold as u64);
        }

        summary
    }
}
