/// One run of text in a rendered message, with an optional hard break in
/// front of it.
///
/// Replies arrive as plain text where newlines, `•` bullets, and `"- "` list
/// markers all mean "start a new visual line". Splitting into segments keeps
/// rendering structural: the panel stacks segment rows instead of
/// interpreting any markup inside the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub break_before: bool,
    pub text: String,
}

impl Segment {
    fn new(break_before: bool, text: impl Into<String>) -> Self {
        Self {
            break_before,
            text: text.into(),
        }
    }
}

/// Splits message content into display segments.
///
/// A break lands immediately before every line that follows a newline, before
/// every `•` occurrence, and before any line that begins with `"- "`. A
/// newline directly followed by such a marker yields one break, not two, so
/// coinciding markers never produce blank filler lines. All non-marker text
/// is carried through verbatim.
pub fn layout_segments(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();

    for (line_index, line) in content.split('\n').enumerate() {
        let after_newline = line_index > 0;
        let list_marker = line.starts_with("- ");

        let mut cuts = vec![0];
        for (bullet_index, _) in line.match_indices('•') {
            if bullet_index != 0 {
                cuts.push(bullet_index);
            }
        }
        cuts.push(line.len());

        for (piece_index, bounds) in cuts.windows(2).enumerate() {
            let piece = &line[bounds[0]..bounds[1]];
            let break_before = if piece_index == 0 {
                after_newline || list_marker || piece.starts_with('•')
            } else {
                true
            };

            segments.push(Segment::new(break_before, piece));
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(content: &str) -> Vec<(bool, String)> {
        layout_segments(content)
            .into_iter()
            .map(|segment| (segment.break_before, segment.text))
            .collect()
    }

    #[test]
    fn plain_text_is_a_single_unbroken_segment() {
        assert_eq!(rendered("Hi there!"), vec![(false, "Hi there!".into())]);
    }

    #[test]
    fn newlines_break_before_each_following_line() {
        assert_eq!(
            rendered("first\nsecond\nthird"),
            vec![
                (false, "first".into()),
                (true, "second".into()),
                (true, "third".into()),
            ]
        );
    }

    #[test]
    fn every_bullet_gets_a_break_in_front_of_it() {
        assert_eq!(
            rendered("steps: • one • two"),
            vec![
                (false, "steps: ".into()),
                (true, "• one ".into()),
                (true, "• two".into()),
            ]
        );
    }

    #[test]
    fn leading_bullet_breaks_even_at_content_start() {
        assert_eq!(rendered("•only"), vec![(true, "•only".into())]);
    }

    #[test]
    fn dash_list_lines_break_including_the_first_line() {
        assert_eq!(rendered("- item"), vec![(true, "- item".into())]);
        assert_eq!(
            rendered("intro\n- a\n- b"),
            vec![
                (false, "intro".into()),
                (true, "- a".into()),
                (true, "- b".into()),
            ]
        );
    }

    #[test]
    fn dash_without_trailing_space_is_not_a_marker() {
        assert_eq!(rendered("-not a list"), vec![(false, "-not a list".into())]);
    }

    #[test]
    fn blank_lines_are_preserved_as_empty_segments() {
        assert_eq!(
            rendered("a\n\nb"),
            vec![
                (false, "a".into()),
                (true, String::new()),
                (true, "b".into()),
            ]
        );
    }

    #[test]
    fn empty_content_is_one_empty_segment() {
        assert_eq!(rendered(""), vec![(false, String::new())]);
    }

    #[test]
    fn segment_texts_preserve_content_verbatim() {
        let content = "alpha\nbeta • gamma\n- delta <b>&</b>";
        let segments = layout_segments(content);

        // Bullet breaks consume nothing; newline breaks consumed exactly one
        // '\n' each. Re-inserting those restores the input byte for byte.
        let mut rebuilt = String::new();
        for segment in &segments {
            if segment.break_before && !segment.text.starts_with('•') {
                rebuilt.push('\n');
            }
            rebuilt.push_str(&segment.text);
        }
        assert_eq!(rebuilt, content);

        // No segment invents characters that were not in the input, markup
        // included: '<', '>', and '&' pass through untouched.
        for segment in &segments {
            assert!(content.contains(segment.text.as_str()));
        }
    }
}
