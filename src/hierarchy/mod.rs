//! Chapter → hinge → question hierarchy.
//!
//! Chapter, hinge and layout question events are merged into one timeline
//! ordered by [`SortKey`] and folded by a small state machine. Closing a
//! hinge or chapter happens on the transition that leaves it, so no node is
//! ever appended twice.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::geometry::SortKey;
use crate::layout::{Heading, LayoutQuestionStart};

/// A hinge and the questions it introduces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HingeNode {
    /// 1-based page number
    pub page: usize,
    /// Hinge text
    pub text: String,
    /// `[x0, y0, x1, y1]`
    pub bbox: [f32; 4],
    /// Question numbers, in document order
    pub questions: Vec<u32>,
}

/// A chapter with its hinges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterNode {
    /// 1-based page number
    pub page: usize,
    /// Chapter text
    pub text: String,
    /// `[x0, y0, x1, y1]`
    pub bbox: [f32; 4],
    /// Every question of the chapter, in document order
    pub questions: Vec<u32>,
    /// Hinges, in document order
    pub hinges: Vec<HingeNode>,
    /// Questions that appear before the chapter's first hinge
    pub questions_without_hinge: Vec<u32>,
}

/// The folded document hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
    /// Chapters, in document order
    pub chapters: Vec<ChapterNode>,
}

/// Chapter and hinge of one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionContext {
    /// Chapter text
    pub chapter: String,
    /// Hinge text, if the question sits under one
    pub hinge: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Event<'a> {
    Chapter(&'a Heading),
    Hinge(&'a Heading),
    Question(&'a LayoutQuestionStart),
}

impl Event<'_> {
    fn sort_key(&self) -> SortKey {
        match self {
            Event::Chapter(h) | Event::Hinge(h) => h.sort_key(),
            Event::Question(q) => q.sort_key(),
        }
    }

    // Chapters open before hinges, hinges before questions at the same key.
    fn rank(&self) -> u8 {
        match self {
            Event::Chapter(_) => 0,
            Event::Hinge(_) => 1,
            Event::Question(_) => 2,
        }
    }
}

enum State {
    Idle,
    InChapter(ChapterNode),
    InChapterAndHinge(ChapterNode, HingeNode),
}

impl State {
    /// Close everything that is open, pushing any finished chapter.
    fn close(self, chapters: &mut Vec<ChapterNode>) {
        match self {
            State::Idle => {},
            State::InChapter(chapter) => chapters.push(chapter),
            State::InChapterAndHinge(mut chapter, hinge) => {
                chapter.hinges.push(hinge);
                chapters.push(chapter);
            },
        }
    }
}

fn open_chapter(heading: &Heading) -> ChapterNode {
    ChapterNode {
        page: heading.page,
        text: heading.text.clone(),
        bbox: heading.bbox.to_array(),
        questions: Vec::new(),
        hinges: Vec::new(),
        questions_without_hinge: Vec::new(),
    }
}

fn open_hinge(heading: &Heading) -> HingeNode {
    HingeNode {
        page: heading.page,
        text: heading.text.clone(),
        bbox: heading.bbox.to_array(),
        questions: Vec::new(),
    }
}

impl Hierarchy {
    /// Fold chapters, hinges and layout question starts into a hierarchy.
    ///
    /// Hinges before the first chapter are ignored. Questions before the
    /// first chapter are left out of the hierarchy. A question number is
    /// placed at most once.
    pub fn build(
        chapters: &[Heading],
        hinges: &[Heading],
        questions: &[LayoutQuestionStart],
    ) -> Self {
        let mut timeline: Vec<Event> = chapters
            .iter()
            .map(Event::Chapter)
            .chain(hinges.iter().map(Event::Hinge))
            .chain(questions.iter().map(Event::Question))
            .collect();
        timeline.sort_by(|a, b| {
            a.sort_key()
                .cmp(&b.sort_key())
                .then_with(|| a.rank().cmp(&b.rank()))
        });

        let mut done: Vec<ChapterNode> = Vec::new();
        let mut seen: HashSet<u32> = HashSet::new();
        let mut state = State::Idle;

        for event in timeline {
            state = match (state, event) {
                (current, Event::Chapter(heading)) => {
                    current.close(&mut done);
                    State::InChapter(open_chapter(heading))
                },
                (State::Idle, Event::Hinge(heading)) => {
                    log::debug!("Hinge {:?} precedes any chapter; ignored", heading.text);
                    State::Idle
                },
                (State::InChapter(chapter), Event::Hinge(heading)) => {
                    State::InChapterAndHinge(chapter, open_hinge(heading))
                },
                (State::InChapterAndHinge(mut chapter, hinge), Event::Hinge(heading)) => {
                    chapter.hinges.push(hinge);
                    State::InChapterAndHinge(chapter, open_hinge(heading))
                },
                (current, Event::Question(start)) if !seen.insert(start.number) => current,
                (State::Idle, Event::Question(start)) => {
                    log::debug!("Question {} precedes any chapter", start.number);
                    State::Idle
                },
                (State::InChapter(mut chapter), Event::Question(start)) => {
                    chapter.questions.push(start.number);
                    chapter.questions_without_hinge.push(start.number);
                    State::InChapter(chapter)
                },
                (State::InChapterAndHinge(mut chapter, mut hinge), Event::Question(start)) => {
                    chapter.questions.push(start.number);
                    hinge.questions.push(start.number);
                    State::InChapterAndHinge(chapter, hinge)
                },
            };
        }
        state.close(&mut done);

        Hierarchy { chapters: done }
    }

    /// Total number of hinges.
    pub fn hinge_count(&self) -> usize {
        self.chapters.iter().map(|c| c.hinges.len()).sum()
    }

    /// Map each placed question number to its chapter and hinge.
    pub fn lookup(&self) -> HashMap<u32, QuestionContext> {
        let mut map = HashMap::new();
        for chapter in &self.chapters {
            for hinge in &chapter.hinges {
                for &number in &hinge.questions {
                    map.insert(
                        number,
                        QuestionContext {
                            chapter: chapter.text.clone(),
                            hinge: Some(hinge.text.clone()),
                        },
                    );
                }
            }
            for &number in &chapter.questions_without_hinge {
                map.insert(
                    number,
                    QuestionContext {
                        chapter: chapter.text.clone(),
                        hinge: None,
                    },
                );
            }
        }
        map
    }

    /// Every hinge text, in document order.
    pub fn hinge_texts(&self) -> Vec<String> {
        self.chapters
            .iter()
            .flat_map(|c| c.hinges.iter().map(|h| h.text.clone()))
            .collect()
    }
}
