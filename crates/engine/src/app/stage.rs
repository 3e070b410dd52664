#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Heading,
    Text,
    Button,
    DragSurface,
}

/// Which gestures an element wants delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listen {
    Tap,
    Drag,
    Wiggle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    pub label: String,
    pub enabled: bool,
    pub bounds: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Listener {
    id: ListenerId,
    element: ElementId,
    listen: Listen,
}

/// The container a scene renders into: a column of fixed-height rows plus
/// the input listeners attached to them.
#[derive(Debug)]
pub struct Stage {
    width: f32,
    row_height: f32,
    elements: Vec<Element>,
    listeners: Vec<Listener>,
    next_element_id: u32,
    next_listener_id: u32,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(320.0, 40.0)
    }
}

impl Stage {
    pub fn new(width: f32, row_height: f32) -> Self {
        Self {
            width: width.max(1.0),
            row_height: row_height.max(1.0),
            elements: Vec::new(),
            listeners: Vec::new(),
            next_element_id: 0,
            next_listener_id: 0,
        }
    }

    pub fn push(&mut self, kind: ElementKind, label: impl Into<String>) -> ElementId {
        let id = ElementId(self.next_element_id);
        self.next_element_id = self.next_element_id.saturating_add(1);
        let row = self.elements.len() as f32;
        self.elements.push(Element {
            id,
            kind,
            label: label.into(),
            enabled: true,
            bounds: Rect {
                x: 0.0,
                y: row * self.row_height,
                width: self.width,
                height: self.row_height,
            },
        });
        id
    }

    pub fn heading(&mut self, label: impl Into<String>) -> ElementId {
        self.push(ElementKind::Heading, label)
    }

    pub fn text(&mut self, label: impl Into<String>) -> ElementId {
        self.push(ElementKind::Text, label)
    }

    pub fn button(&mut self, label: impl Into<String>) -> ElementId {
        self.push(ElementKind::Button, label)
    }

    pub fn drag_surface(&mut self, label: impl Into<String>) -> ElementId {
        self.push(ElementKind::DragSurface, label)
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|element| element.id == id)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn find_by_label(&self, needle: &str) -> Option<&Element> {
        self.elements
            .iter()
            .find(|element| element.label.contains(needle))
    }

    pub fn set_label(&mut self, id: ElementId, label: impl Into<String>) -> bool {
        match self.elements.iter_mut().find(|element| element.id == id) {
            Some(element) => {
                element.label = label.into();
                true
            }
            None => false,
        }
    }

    pub fn set_enabled(&mut self, id: ElementId, enabled: bool) -> bool {
        match self.elements.iter_mut().find(|element| element.id == id) {
            Some(element) => {
                element.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn listen(&mut self, element: ElementId, listen: Listen) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id = self.next_listener_id.saturating_add(1);
        self.listeners.push(Listener {
            id,
            element,
            listen,
        });
        id
    }

    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_listening(&self, element: ElementId, listen: Listen) -> bool {
        self.listeners
            .iter()
            .any(|listener| listener.element == element && listener.listen == listen)
    }

    /// Topmost enabled element under the point that listens for `listen`.
    pub fn hit_test(&self, x: f32, y: f32, listen: Listen) -> Option<ElementId> {
        self.elements
            .iter()
            .rev()
            .filter(|element| element.enabled && element.bounds.contains(x, y))
            .map(|element| element.id)
            .find(|id| self.is_listening(*id, listen))
    }

    /// Removes all content and every listener.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.listeners.clear();
    }

    pub fn render_lines(&self) -> Vec<String> {
        self.elements
            .iter()
            .map(|element| {
                let marker = match element.kind {
                    ElementKind::Heading => "#",
                    ElementKind::Text => " ",
                    ElementKind::Button if element.enabled => ">",
                    ElementKind::Button => "x",
                    ElementKind::DragSurface => "~",
                };
                format!("[{:>2}] {marker} {}", element.id.0, element.label)
            })
            .collect()
    }
}
