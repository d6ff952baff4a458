use super::automaton::{Automaton, Read, Transition};

impl Automaton {
    /// Converts the automaton to the [graphviz](https://graphviz.org/docs/layouts/dot/) dot
    /// language format.
    pub fn to_dot(&self) -> String {
        let final_dot = format!(
            "node [shape = doublecircle]; {};",
            self.states()
                .filter(|(_, s)| s.is_final())
                .map(|(_, s)| s.name().to_string())
                .collect::<Vec<String>>()
                .join(" ")
        );

        let entry = self
            .initial_state()
            .map(|id| format!("\t__start [shape = point];\n\t__start -> {};\n", self.name_of(id)))
            .unwrap_or_default();

        format!(
            "digraph automaton {{\n\
                \trankdir = LR;\n\
            \n\
                \t// final states\n\
                \t{}\n\
                {}\
                \tnode [shape = circle];\n\
            \n\
                {}\n\
            }}",
            final_dot,
            entry,
            self.state_dot()
                .chain(self.transition_dot())
                .map(|l| format!("\t{}", l))
                .collect::<Vec<String>>()
                .join("\n")
        )
    }

    /// Labels final states with the token they recognize.
    fn state_dot(&self) -> impl Iterator<Item = String> + '_ {
        self.states().filter_map(|(_, state)| {
            state.tag().map(|tag| {
                let marker = if state.backtrack() { " (backtrack)" } else { "" };
                format!(
                    "{} [xlabel = \"{}{}\"];",
                    state.name(),
                    escape(tag),
                    marker
                )
            })
        })
    }

    /// Converts the transitions to the dot format and returns an iterator over it.
    fn transition_dot(&self) -> impl Iterator<Item = String> + '_ {
        self.transitions().map(|(_, Transition { from, to, read })| {
            let label = match read {
                Read::Symbol(c) => escape(&c.to_string()),
                Read::Lambda => "λ".to_string(),
            };
            format!(
                "{} -> {} [label = \"{}\"];",
                self.name_of(from),
                self.name_of(to),
                label
            )
        })
    }
}

fn escape(label: &str) -> String {
    label.escape_default().to_string()
}
