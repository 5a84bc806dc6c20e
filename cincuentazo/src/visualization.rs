use crate::{Card, TableView, TurnState};

/// Renders cards as `[1] A♥  [2] 10♣ ...`, numbered from one.
pub fn numbered_hand(hand: &[Card]) -> String {
    hand.iter()
        .enumerate()
        .map(|(i, card)| format!("[{}] {}", i + 1, card))
        .collect::<Vec<_>>()
        .join("  ")
}

/// One line per player plus a header with the table sum and top card.
///
/// Machine hands are shown face-down.
pub fn describe_table(view: &TableView) -> String {
    let top = match view.top_card {
        Some(card) => card.to_string(),
        None => String::from("-"),
    };
    let mut result = format!(
        "Table: {} (top {}), deck {}",
        view.table_sum, top, view.deck_remaining
    );
    for (idx, player) in view.players.iter().enumerate() {
        let marker = if view.current_player == Some(idx) {
            '>'
        } else {
            ' '
        };
        let cards = if player.eliminated {
            String::from("eliminated")
        } else if player.is_machine {
            "🂠 ".repeat(player.hand.len()).trim_end().to_owned()
        } else {
            numbered_hand(&player.hand)
        };
        result += &format!("\n{} {:<8} {}", marker, player.name, cards);
    }
    if view.state == TurnState::GameOver {
        result += "\n  (game over)";
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{card, PlayerView};

    #[test]
    fn table_description() {
        let view = TableView {
            players: vec![
                PlayerView {
                    name: String::from("You"),
                    is_machine: false,
                    hand: vec![card!("A♥"), card!("10♣")],
                    eliminated: false,
                },
                PlayerView {
                    name: String::from("CPU-1"),
                    is_machine: true,
                    hand: vec![card!("2♦"), card!("3♦")],
                    eliminated: false,
                },
                PlayerView {
                    name: String::from("CPU-2"),
                    is_machine: true,
                    hand: vec![],
                    eliminated: true,
                },
            ],
            table_sum: 37,
            top_card: Some(card!("K♠")),
            table_pile_len: 5,
            deck_remaining: 30,
            current_player: Some(0),
            state: TurnState::AwaitingHumanMove,
            outcome: None,
        };
        assert_eq!(
            describe_table(&view),
            "Table: 37 (top K♠), deck 30\n\
             > You      [1] A♥  [2] 10♣\n\
             \u{20} CPU-1    🂠 🂠\n\
             \u{20} CPU-2    eliminated"
        );
    }
}
