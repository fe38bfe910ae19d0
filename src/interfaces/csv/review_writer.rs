use crate::application::dashboard::{Candidates, OrderReview};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ReviewRow<'a> {
    order_id: u64,
    status: &'a str,
    customer: String,
    address: &'a str,
    total: Decimal,
    restaurant: &'a str,
    outcome: &'static str,
    candidates: String,
}

/// Writes the manager's order review as CSV, one row per order.
///
/// `candidates` lists ranked restaurants as `Name (1.234 km)` joined by `; `;
/// for failed rankings it carries the failure text instead.
pub struct ReviewWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReviewWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_reviews(&mut self, reviews: &[OrderReview]) -> Result<()> {
        if reviews.is_empty() {
            self.writer.write_record([
                "order_id",
                "status",
                "customer",
                "address",
                "total",
                "restaurant",
                "outcome",
                "candidates",
            ])?;
        }
        for review in reviews {
            let candidates = match &review.candidates {
                Candidates::Ranked { restaurants } => restaurants
                    .iter()
                    .map(|r| format!("{} ({:.3} km)", r.name, r.distance_km))
                    .collect::<Vec<_>>()
                    .join("; "),
                Candidates::NoEligibleRestaurant => String::new(),
                Candidates::DistanceUnresolvable { failure } => failure.to_string(),
            };
            self.writer.serialize(ReviewRow {
                order_id: review.order.id,
                status: review.order.status.as_str(),
                customer: review.order.customer_name(),
                address: &review.order.contact.address,
                total: review.total,
                restaurant: review.restaurant_name.as_deref().unwrap_or(""),
                outcome: review.candidates.label(),
                candidates,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ranking::{RankedRestaurant, RankingFailure};
    use crate::domain::catalog::Price;
    use crate::domain::order::{Contact, LineItem, NewOrder, Order, OrderStatus, PaymentMethod};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn review(id: u64, candidates: Candidates) -> OrderReview {
        let mut order = Order::from_new(
            id,
            NewOrder {
                contact: Contact {
                    firstname: "Ivan".into(),
                    lastname: "Petrov".into(),
                    phonenumber: "+79990000000".into(),
                    address: "Tverskaya 1".into(),
                },
                comment: String::new(),
                payment_method: PaymentMethod::Cash,
                items: vec![LineItem::new(1, 2, Price::new(dec!(189.00)).unwrap()).unwrap()],
                created_at: Utc::now(),
            },
        );
        order.status = OrderStatus::InKitchen;
        OrderReview {
            total: order.total(),
            order,
            restaurant_name: Some("Star Burger".into()),
            candidates,
        }
    }

    fn render(reviews: &[OrderReview]) -> String {
        let mut out = Vec::new();
        ReviewWriter::new(&mut out).write_reviews(reviews).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_ranked_row() {
        let text = render(&[review(
            1,
            Candidates::Ranked {
                restaurants: vec![
                    RankedRestaurant {
                        restaurant: 1,
                        name: "Star Burger".into(),
                        distance_km: 1.5,
                    },
                    RankedRestaurant {
                        restaurant: 2,
                        name: "Star Burger Airport".into(),
                        distance_km: 30.25,
                    },
                ],
            },
        )]);

        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "order_id,status,customer,address,total,restaurant,outcome,candidates"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1,in_kitchen,Ivan Petrov,Tverskaya 1,378.00,Star Burger,ranked,Star Burger (1.500 km); Star Burger Airport (30.250 km)"
        );
    }

    #[test]
    fn test_failure_rows() {
        let text = render(&[
            review(1, Candidates::NoEligibleRestaurant),
            review(
                2,
                Candidates::DistanceUnresolvable {
                    failure: RankingFailure::AddressUnresolvable {
                        address: "Nowhere".into(),
                    },
                },
            ),
        ]);
        assert!(text.contains(
            "1,in_kitchen,Ivan Petrov,Tverskaya 1,378.00,Star Burger,no_eligible_restaurant,\n"
        ));
        assert!(
            text.contains("distance_unresolvable,\"address \"\"Nowhere\"\" could not be geocoded\"")
        );
    }

    #[test]
    fn test_empty_report_has_header() {
        assert_eq!(
            render(&[]),
            "order_id,status,customer,address,total,restaurant,outcome,candidates\n"
        );
    }
}
