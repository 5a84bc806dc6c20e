use crate::{Card, Rank, Suit};

impl quickcheck::Arbitrary for Suit {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        *g.choose(&Suit::ALL).unwrap()
    }
}

impl quickcheck::Arbitrary for Rank {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        *g.choose(&Rank::ALL).unwrap()
    }
}

impl quickcheck::Arbitrary for Card {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Self {
            rank: Rank::arbitrary(g),
            suit: Suit::arbitrary(g),
        }
    }
}
