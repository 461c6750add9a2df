use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Submit(String),
    StartPrompt(char),
    GPrefix,
    InputChar(char),
    Backspace,
    CancelPrompt,
    SubmitPrompt,
    HistoryUp,
    HistoryDown,
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::Prompt => map_prompt_mode_key(key),
    }
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char(' ') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::Submit("ctrl+space".to_string()))
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::Submit("ctrl+u".to_string()))
        }
        KeyCode::Char(':') => Some(Action::StartPrompt(':')),
        KeyCode::Char('/') => Some(Action::StartPrompt('/')),
        KeyCode::Char('!') => Some(Action::StartPrompt('!')),
        KeyCode::Char('g') if key.modifiers.is_empty() => Some(Action::GPrefix),
        KeyCode::Char(c)
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
        {
            Some(Action::Submit(c.to_string()))
        }
        KeyCode::Down => Some(Action::Submit("down".to_string())),
        KeyCode::Up => Some(Action::Submit("up".to_string())),
        KeyCode::Left => Some(Action::Submit("left".to_string())),
        KeyCode::Right => Some(Action::Submit("right".to_string())),
        _ => None,
    }
}

fn map_prompt_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelPrompt),
        KeyCode::Enter => Some(Action::SubmitPrompt),
        KeyCode::Char('m') | KeyCode::Char('j')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Some(Action::SubmitPrompt)
        }
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Up => Some(Action::HistoryUp),
        KeyCode::Down => Some(Action::HistoryDown),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, InputMode, map_key};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn normal_mode_submits_plain_keys_as_lines() {
        let key = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE);
        assert_eq!(
            map_key(InputMode::Normal, key),
            Some(Action::Submit("j".to_string()))
        );
        let space = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(
            map_key(InputMode::Normal, space),
            Some(Action::Submit(" ".to_string()))
        );
    }

    #[test]
    fn normal_mode_prompt_prefixes() {
        for (c, expected) in [(':', ':'), ('/', '/'), ('!', '!')] {
            let key = KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
            assert_eq!(
                map_key(InputMode::Normal, key),
                Some(Action::StartPrompt(expected))
            );
        }
    }

    #[test]
    fn normal_mode_ctrl_space_is_range_mark() {
        let key = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::CONTROL);
        assert_eq!(
            map_key(InputMode::Normal, key),
            Some(Action::Submit("ctrl+space".to_string()))
        );
    }

    #[test]
    fn g_is_a_prefix_but_shift_g_submits() {
        let g = KeyEvent::new(KeyCode::Char('g'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, g), Some(Action::GPrefix));
        let shift_g = KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT);
        assert_eq!(
            map_key(InputMode::Normal, shift_g),
            Some(Action::Submit("G".to_string()))
        );
    }

    #[test]
    fn prompt_mode_edits_and_submits() {
        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(
            map_key(InputMode::Prompt, key),
            Some(Action::InputChar('a'))
        );
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Prompt, enter), Some(Action::SubmitPrompt));
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Prompt, esc), Some(Action::CancelPrompt));
        let up = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Prompt, up), Some(Action::HistoryUp));
    }
}
